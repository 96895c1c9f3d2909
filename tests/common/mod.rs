#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;

pub type Pool = idlepool::Pool<Manager>;

#[derive(Debug)]
pub struct Conn {
    pub id: usize,
    closes: Arc<AtomicUsize>,
    fail_close: bool,
}

#[async_trait]
impl idlepool::Closable for Conn {
    type Error = String;

    async fn close(&self) -> Result<(), String> {
        let _ = self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            Err(format!("conn {} refused to close", self.id))
        } else {
            Ok(())
        }
    }
}

/// Hands out connections with increasing ids, starting at 0 for the primary
/// handle, and remembers how often each one was closed.
#[derive(Debug, Default)]
pub struct Manager {
    pub create_fail: AtomicBool,
    fail_close: Mutex<Vec<usize>>,
    closes: Mutex<Vec<Arc<AtomicUsize>>>,
}

impl Manager {
    pub fn failing() -> Self {
        let manager = Self::default();
        manager.create_fail.store(true, Ordering::SeqCst);
        manager
    }

    pub fn failing_close(ids: &[usize]) -> Self {
        let manager = Self::default();
        *manager.fail_close.lock().unwrap() = ids.to_vec();
        manager
    }

    pub fn created(&self) -> usize {
        self.closes.lock().unwrap().len()
    }

    pub fn closes(&self, id: usize) -> usize {
        self.closes.lock().unwrap()[id].load(Ordering::SeqCst)
    }
}

#[async_trait]
impl idlepool::Manager for Manager {
    type Type = Conn;
    type Error = &'static str;

    async fn create(&self) -> Result<Conn, &'static str> {
        if self.create_fail.load(Ordering::SeqCst) {
            return Err("backend unavailable");
        }
        let mut closes = self.closes.lock().unwrap();
        let id = closes.len();
        let counter = Arc::new(AtomicUsize::new(0));
        closes.push(counter.clone());
        Ok(Conn {
            id,
            closes: counter,
            fail_close: self.fail_close.lock().unwrap().contains(&id),
        })
    }
}

pub type ErrorLog = Arc<Mutex<Vec<(String, bool)>>>;

/// Builds a pool whose reclaim errors are collected into the returned log.
pub async fn pool_with_error_log(
    builder: idlepool::PoolBuilder<Manager>,
) -> (Pool, ErrorLog) {
    let errors = ErrorLog::default();
    let sink = errors.clone();
    let pool = builder
        .on_reclaim_error(move |err| sink.lock().unwrap().push((err.error, err.forced)))
        .build()
        .await
        .unwrap();
    (pool, errors)
}
