use std::future::Future;

use crossbeam_channel::Sender;
use log::debug;

use crate::message::Message;

/// Runs futures on the background runtime and posts their results back to
/// the interactive thread as messages.
#[derive(Clone)]
pub struct TaskRunner {
    handle: tokio::runtime::Handle,
    sender: Sender<Message>,
}

impl TaskRunner {
    pub fn new(handle: tokio::runtime::Handle, sender: Sender<Message>) -> Self {
        Self { handle, sender }
    }

    /// Await `future` off the interactive thread, then deliver `map(output)`.
    pub fn perform<T, F, M>(&self, future: F, map: M)
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        M: FnOnce(T) -> Message + Send + 'static,
    {
        let sender = self.sender.clone();
        self.handle.spawn(async move {
            let output = future.await;
            if sender.send(map(output)).is_err() {
                debug!("Interactive thread gone; dropping background result");
            }
        });
    }

    /// Like [`Self::perform`], but the future receives a sender so it can
    /// post intermediate messages before its final one.
    pub fn run<T, F, Fut, M>(&self, start: F, map: M)
    where
        F: FnOnce(Sender<Message>) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        M: FnOnce(T) -> Message + Send + 'static,
    {
        let future = start(self.sender.clone());
        self.perform(future, map);
    }
}
