//! Single-producer, single-consumer input queue.
//!
//! The window thread owns the [`InputSender`]; the render loop owns the
//! [`InputReceiver`] and drains it once per frame. No lock is shared.

use std::sync::mpsc;

use super::event::InputEvent;

/// Create a connected sender/receiver pair.
pub fn input_channel() -> (InputSender, InputReceiver) {
    let (tx, rx) = mpsc::channel();
    (InputSender { tx }, InputReceiver { rx })
}

/// Producing end of the input queue.
#[derive(Debug, Clone)]
pub struct InputSender {
    tx: mpsc::Sender<InputEvent>,
}

impl InputSender {
    /// Queue `event`. Returns `false` if the renderer side is gone.
    pub fn send(&self, event: InputEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Consuming end of the input queue.
#[derive(Debug)]
pub struct InputReceiver {
    rx: mpsc::Receiver<InputEvent>,
}

impl InputReceiver {
    /// Every event queued so far, in send order, without blocking.
    pub fn drain(&self) -> impl Iterator<Item = InputEvent> + '_ {
        self.rx.try_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_order() {
        let (tx, rx) = input_channel();
        assert!(tx.send(InputEvent::PointerUp));
        assert!(tx.send(InputEvent::Scroll { delta: 1.0 }));
        let events: Vec<InputEvent> = rx.drain().collect();
        assert_eq!(
            events,
            [InputEvent::PointerUp, InputEvent::Scroll { delta: 1.0 }]
        );
        assert_eq!(rx.drain().count(), 0);
    }

    #[test]
    fn sender_crosses_threads() {
        let (tx, rx) = input_channel();
        let producer = std::thread::spawn(move || {
            for i in 0..100 {
                let _ = tx.send(InputEvent::PointerMove {
                    x: i as f32,
                    y: 0.0,
                });
            }
        });
        producer.join().unwrap();
        assert_eq!(rx.drain().count(), 100);
    }

    #[test]
    fn send_fails_after_receiver_drop() {
        let (tx, rx) = input_channel();
        drop(rx);
        assert!(!tx.send(InputEvent::RequestPick));
    }
}
