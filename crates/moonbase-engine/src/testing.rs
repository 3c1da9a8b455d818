//! Scripted driver for engine tests: records every statement, replays
//! queued results, and injects failures at chosen points. No real store.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use moonbase_sql::{Dialect, SqlParam, SqlRow};

use crate::driver::{DriverError, SqlDriver, SqlTransaction};

#[derive(Default)]
struct Inner {
    log: Mutex<Vec<String>>,
    exec_queue: Mutex<VecDeque<Result<u64, DriverError>>>,
    fetch_all_queue: Mutex<VecDeque<Result<Vec<SqlRow>, DriverError>>>,
    fetch_opt_queue: Mutex<VecDeque<Result<Option<SqlRow>, DriverError>>>,
}

impl Inner {
    fn log(&self, entry: impl Into<String>) {
        self.log.lock().unwrap().push(entry.into());
    }

    fn next_exec(&self) -> Result<u64, DriverError> {
        self.exec_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(1))
    }

    fn next_fetch_all(&self) -> Result<Vec<SqlRow>, DriverError> {
        self.fetch_all_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn next_fetch_opt(&self) -> Result<Option<SqlRow>, DriverError> {
        self.fetch_opt_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }
}

/// A fully scripted [`SqlDriver`].
pub struct ScriptedDriver {
    dialect: Dialect,
    inner: Arc<Inner>,
}

impl ScriptedDriver {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            inner: Arc::new(Inner::default()),
        }
    }

    /// Queues the outcome of the next execute call (driver or transaction).
    pub fn push_exec(&self, result: Result<u64, DriverError>) {
        self.inner.exec_queue.lock().unwrap().push_back(result);
    }

    /// Queues N successful execute outcomes, then one failure.
    pub fn fail_execute_after(&self, successes: usize, error: DriverError) {
        for _ in 0..successes {
            self.push_exec(Ok(1));
        }
        self.push_exec(Err(error));
    }

    /// Queues the next fetch_all result.
    pub fn push_rows(&self, rows: Vec<SqlRow>) {
        self.inner
            .fetch_all_queue
            .lock()
            .unwrap()
            .push_back(Ok(rows));
    }

    /// Queues the next fetch_optional result.
    pub fn push_optional(&self, row: Option<SqlRow>) {
        self.inner
            .fetch_opt_queue
            .lock()
            .unwrap()
            .push_back(Ok(row));
    }

    /// Every statement seen so far, in execution order. `BEGIN`, `COMMIT`,
    /// and `ROLLBACK` appear as pseudo-statements.
    pub fn statements(&self) -> Vec<String> {
        self.inner.log.lock().unwrap().clone()
    }
}

pub struct ScriptedTx {
    inner: Arc<Inner>,
}

impl SqlTransaction for ScriptedTx {
    async fn execute(&mut self, sql: &str, _params: &[SqlParam]) -> Result<u64, DriverError> {
        self.inner.log(sql);
        self.inner.next_exec()
    }

    async fn fetch_optional(
        &mut self,
        sql: &str,
        _params: &[SqlParam],
    ) -> Result<Option<SqlRow>, DriverError> {
        self.inner.log(sql);
        self.inner.next_fetch_opt()
    }

    async fn commit(self) -> Result<(), DriverError> {
        self.inner.log("COMMIT");
        Ok(())
    }

    async fn rollback(self) -> Result<(), DriverError> {
        self.inner.log("ROLLBACK");
        Ok(())
    }
}

impl SqlDriver for ScriptedDriver {
    type Tx = ScriptedTx;

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute(&self, sql: &str, _params: &[SqlParam]) -> Result<u64, DriverError> {
        self.inner.log(sql);
        self.inner.next_exec()
    }

    async fn fetch_all(&self, sql: &str, _params: &[SqlParam]) -> Result<Vec<SqlRow>, DriverError> {
        self.inner.log(sql);
        self.inner.next_fetch_all()
    }

    async fn fetch_optional(
        &self,
        sql: &str,
        _params: &[SqlParam],
    ) -> Result<Option<SqlRow>, DriverError> {
        self.inner.log(sql);
        self.inner.next_fetch_opt()
    }

    async fn begin(&self) -> Result<Self::Tx, DriverError> {
        self.inner.log("BEGIN");
        Ok(ScriptedTx {
            inner: Arc::clone(&self.inner),
        })
    }
}
