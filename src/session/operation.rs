use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use portable_atomic::AtomicUsize;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use waitgroup::WaitGroup;

use crate::error::{Error, Result};

/// Operation is a unit of work run on the session's event context.
pub(crate) struct Operation(
    pub Box<dyn (FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>) + Send>,
    pub &'static str,
);

impl Operation {
    pub(crate) fn new(
        op: impl FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> + Send + 'static,
        description: &'static str,
    ) -> Self {
        Self(Box::new(op), description)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Operation")
            .field(&"_")
            .field(&self.1)
            .finish()
    }
}

/// Operations is a single-consumer task queue. Engine callbacks and event
/// handler invocations are funneled through it, so they run one at a time,
/// in enqueue order, on the runtime the session was built for instead of
/// on the engine's threads.
pub(crate) struct Operations {
    length: Arc<AtomicUsize>,
    ops_tx: mpsc::UnboundedSender<Operation>,
    close_tx: mpsc::Sender<()>,
}

impl Operations {
    pub(crate) fn new(runtime: &Handle) -> Self {
        let length = Arc::new(AtomicUsize::new(0));
        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = mpsc::channel(1);
        let l = Arc::clone(&length);
        runtime.spawn(async move {
            Operations::start(l, ops_rx, close_rx).await;
        });

        Operations {
            length,
            ops_tx,
            close_tx,
        }
    }

    /// enqueue adds a new action to be executed after every action already
    /// queued. It never blocks, so it is safe to call from engine threads.
    pub(crate) fn enqueue(&self, op: Operation) -> Result<()> {
        self.length.fetch_add(1, Ordering::SeqCst);
        if self.ops_tx.send(op).is_err() {
            self.length.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::ErrSessionClosed);
        }

        Ok(())
    }

    /// is_empty checks if there are tasks in the queue
    pub(crate) fn is_empty(&self) -> bool {
        self.length.load(Ordering::SeqCst) == 0
    }

    /// done blocks until all currently enqueued operations are finished executing.
    pub(crate) async fn done(&self) {
        let wg = WaitGroup::new();
        let w = wg.worker();
        let _ = self.enqueue(Operation::new(
            move || {
                Box::pin(async move {
                    drop(w);
                })
            },
            "Operations::done",
        ));
        wg.wait().await;
    }

    async fn start(
        length: Arc<AtomicUsize>,
        mut ops_rx: mpsc::UnboundedReceiver<Operation>,
        mut close_rx: mpsc::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = close_rx.recv() => {
                    break;
                }
                result = ops_rx.recv() => {
                    let Some(op) = result else {
                        break;
                    };
                    log::trace!("running {}", op.1);
                    (op.0)().await;
                    length.fetch_sub(1, Ordering::SeqCst);
                }
            }
        }
    }

    /// close stops the queue once every operation enqueued before it has
    /// run. It does not wait, so an operation may close its own queue.
    pub(crate) fn close(&self) {
        let close_tx = self.close_tx.clone();
        let _ = self.enqueue(Operation::new(
            move || {
                Box::pin(async move {
                    let _ = close_tx.try_send(());
                })
            },
            "Operations::close",
        ));
    }
}

#[cfg(test)]
mod test {
    use tokio::sync::Mutex;

    use super::*;

    #[tokio::test]
    async fn test_operations_enqueue() -> Result<()> {
        let ops = Operations::new(&Handle::current());
        for _ in 0..100 {
            let results = Arc::new(Mutex::new(vec![]));
            for k in 0..16 {
                let r = Arc::clone(&results);
                ops.enqueue(Operation::new(
                    move || {
                        Box::pin(async move {
                            let mut r2 = r.lock().await;
                            r2.push(k);
                        })
                    },
                    "test_operations_enqueue",
                ))?;
            }

            ops.done().await;
            let expected: Vec<usize> = (0..16).collect();
            {
                let r = results.lock().await;
                assert_eq!(&*r, &expected);
            }
            assert!(ops.is_empty());
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_operations_done() -> Result<()> {
        let ops = Operations::new(&Handle::current());
        ops.done().await;

        Ok(())
    }

    #[tokio::test]
    async fn test_operations_enqueue_after_close() -> Result<()> {
        let ops = Operations::new(&Handle::current());
        ops.close();
        ops.done().await;

        // the consumer is gone once close has been processed
        let mut closed = false;
        for _ in 0..100 {
            let result = ops.enqueue(Operation::new(|| Box::pin(async {}), "noop"));
            if result.is_err() {
                closed = true;
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(closed);

        Ok(())
    }

    #[tokio::test]
    async fn test_operations_close_runs_pending() -> Result<()> {
        let ops = Arc::new(Operations::new(&Handle::current()));
        let results = Arc::new(Mutex::new(vec![]));

        for k in 0..4 {
            let r = Arc::clone(&results);
            let o = Arc::clone(&ops);
            ops.enqueue(Operation::new(
                move || {
                    Box::pin(async move {
                        r.lock().await.push(k);
                        // closing from inside an operation must not block it
                        if k == 1 {
                            o.close();
                        }
                    })
                },
                "test_operations_close_runs_pending",
            ))?;
        }

        ops.done().await;
        assert_eq!(&*results.lock().await, &[0, 1, 2, 3]);

        Ok(())
    }
}
