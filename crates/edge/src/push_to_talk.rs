//! Stand-in for the "user input edge" the push-to-talk mode toggles on
//! (a physical button in a real device). Without dedicated hardware, the
//! edge binary toggles capture on an Enter keypress from stdin.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

pub struct PushToTalkSource {
    rx: mpsc::Receiver<()>,
}

impl PushToTalkSource {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(_)) => {
                        if tx.send(()).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) | Err(_) => break,
                }
            }
        });
        Self { rx }
    }

    /// Resolves to `true` each time the user presses Enter.
    pub async fn recv(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}
