use std::time::Duration;
use tokio::sync::mpsc;

/// Trailing-edge debouncer.
///
/// Values pushed in quick succession collapse into the last one, which is
/// emitted once no new value has arrived for `delay`. Pending input is
/// flushed when the debouncer is dropped.
pub struct Debouncer<T> {
  tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
  /// Create a debouncer and the receiver its settled values arrive on.
  ///
  /// Must be called inside a tokio runtime.
  pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
    let (tx, mut input) = mpsc::unbounded_channel::<T>();
    let (output, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
      let mut pending: Option<T> = None;

      loop {
        if pending.is_none() {
          match input.recv().await {
            Some(value) => pending = Some(value),
            None => break,
          }
          continue;
        }

        tokio::select! {
          next = input.recv() => match next {
            Some(value) => pending = Some(value),
            None => {
              if let Some(value) = pending.take() {
                let _ = output.send(value);
              }
              break;
            }
          },
          _ = tokio::time::sleep(delay) => {
            if let Some(value) = pending.take() {
              if output.send(value).is_err() {
                break;
              }
            }
          }
        }
      }
    });

    (Self { tx }, rx)
  }

  /// Push a new value, restarting the delay.
  ///
  /// Returns false once the receiving side is gone.
  pub fn push(&self, value: T) -> bool {
    self.tx.send(value).is_ok()
  }
}
