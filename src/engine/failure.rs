// src/engine/failure.rs

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::errors::DagRunError;

/// The run's terminal-error slot.
///
/// The first error recorded is kept as-is and stays authoritative; every
/// later one is appended as text. Recording any error cancels the attached
/// token so task bodies that watch it can stop early.
#[derive(Debug, Default)]
pub struct FailureSlot {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    first: Option<DagRunError>,
    others: Vec<String>,
    token: Option<CancellationToken>,
}

impl FailureSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel `token` on the first recorded error. If the slot already
    /// holds one, `token` is cancelled right away.
    pub fn attach(&self, token: CancellationToken) {
        let mut inner = self.lock();
        if inner.first.is_some() {
            token.cancel();
        }
        inner.token = Some(token);
    }

    pub fn record(&self, err: DagRunError) {
        let mut inner = self.lock();
        match inner.first {
            None => {
                error!(error = %err, "fatal error recorded; cancelling run");
                inner.first = Some(err);
                if let Some(token) = &inner.token {
                    token.cancel();
                }
            }
            Some(_) => {
                debug!(error = %err, "additional error appended");
                inner.others.push(err.to_string());
            }
        }
    }

    /// Record `Cancelled` unless some other error got there first.
    pub fn record_cancelled(&self) {
        let mut inner = self.lock();
        if inner.first.is_none() {
            inner.first = Some(DagRunError::Cancelled);
            if let Some(token) = &inner.token {
                token.cancel();
            }
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.lock().first.is_some()
    }

    /// Drain the slot. More than one recorded error yields `Aggregate`.
    pub fn take(&self) -> Option<DagRunError> {
        let mut inner = self.lock();
        let first = inner.first.take()?;
        let others = std::mem::take(&mut inner.others);
        if others.is_empty() {
            Some(first)
        } else {
            Some(DagRunError::Aggregate {
                first: Box::new(first),
                others,
            })
        }
    }
}

