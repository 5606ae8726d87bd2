// Scripted in-memory DeviceClient for unit tests.
#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mowlink_api::Error;

use crate::client::DeviceClient;
use crate::model::{ConfigSnapshot, DeviceId, Mode, OperationalState, StatusSnapshot};

/// One scripted response. Scripts fall back to a success when exhausted.
#[derive(Debug, Clone)]
pub(crate) enum Reply<T> {
    Ok(T),
    Auth,
    Fail,
    Hang,
    Delay(Duration, Box<Reply<T>>),
}

impl<T> Reply<T> {
    pub(crate) fn after(delay: Duration, then: Reply<T>) -> Self {
        Self::Delay(delay, Box::new(then))
    }
}

async fn resolve<T: Send>(mut reply: Reply<T>) -> Result<T, Error> {
    loop {
        match reply {
            Reply::Delay(delay, next) => {
                tokio::time::sleep(delay).await;
                reply = *next;
            }
            Reply::Ok(value) => return Ok(value),
            Reply::Auth => {
                return Err(Error::Authentication {
                    message: "401 Unauthorized".into(),
                });
            }
            Reply::Fail => {
                return Err(Error::Http {
                    status: 503,
                    body: "backend unavailable".into(),
                });
            }
            Reply::Hang => return std::future::pending().await,
        }
    }
}

pub(crate) struct FakeClient {
    device_id: DeviceId,
    status: Mutex<VecDeque<Reply<OperationalState>>>,
    reload: Mutex<VecDeque<Reply<()>>>,
    config: Mutex<VecDeque<Reply<bool>>>,
    mode: Mutex<VecDeque<Reply<()>>>,
    current: Mutex<VecDeque<Reply<Option<Mode>>>>,
    pub status_calls: AtomicUsize,
    pub reload_calls: AtomicUsize,
    pub config_calls: AtomicUsize,
    pub set_mode_calls: AtomicUsize,
    pub current_calls: AtomicUsize,
    pub modes_sent: Mutex<Vec<Mode>>,
}

impl FakeClient {
    pub(crate) fn new(device_id: &str) -> Self {
        Self {
            device_id: DeviceId::from(device_id),
            status: Mutex::new(VecDeque::new()),
            reload: Mutex::new(VecDeque::new()),
            config: Mutex::new(VecDeque::new()),
            mode: Mutex::new(VecDeque::new()),
            current: Mutex::new(VecDeque::new()),
            status_calls: AtomicUsize::new(0),
            reload_calls: AtomicUsize::new(0),
            config_calls: AtomicUsize::new(0),
            set_mode_calls: AtomicUsize::new(0),
            current_calls: AtomicUsize::new(0),
            modes_sent: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push_status(&self, reply: Reply<OperationalState>) -> &Self {
        self.status.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn push_reload(&self, reply: Reply<()>) -> &Self {
        self.reload.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn push_config(&self, reply: Reply<bool>) -> &Self {
        self.config.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn push_mode(&self, reply: Reply<()>) -> &Self {
        self.mode.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn push_current(&self, reply: Reply<Option<Mode>>) -> &Self {
        self.current.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl DeviceClient for FakeClient {
    async fn fetch_status(&self) -> Result<StatusSnapshot, Error> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .status
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Ok(OperationalState::Charge));
        let state = resolve(reply).await?;
        Ok(StatusSnapshot::new(self.device_id.clone(), state))
    }

    async fn reload_config(&self) -> Result<(), Error> {
        self.reload_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.reload.lock().unwrap().pop_front().unwrap_or(Reply::Ok(()));
        resolve(reply).await
    }

    async fn fetch_config(&self) -> Result<ConfigSnapshot, Error> {
        self.config_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.config.lock().unwrap().pop_front().unwrap_or(Reply::Ok(true));
        let validated = resolve(reply).await?;
        let mut snapshot = ConfigSnapshot::new(self.device_id.clone(), validated);
        snapshot.brain_version = Some("4.2.0".into());
        Ok(snapshot)
    }

    async fn fetch_mode(&self) -> Result<Option<Mode>, Error> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.current.lock().unwrap().pop_front().unwrap_or(Reply::Ok(None));
        resolve(reply).await
    }

    async fn set_mode(&self, mode: Mode, _use_current_as_baseline: bool) -> Result<(), Error> {
        self.set_mode_calls.fetch_add(1, Ordering::SeqCst);
        self.modes_sent.lock().unwrap().push(mode);
        let reply = self.mode.lock().unwrap().pop_front().unwrap_or(Reply::Ok(()));
        resolve(reply).await
    }
}
