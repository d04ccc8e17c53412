//! Console gateway.
//!
//! Runs the bot over stdin/stdout for local use and demos. Buttons become
//! numbered choices and modal forms become a sequence of line prompts; the
//! single operator is always `user:0` in `channel:0`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{ChannelId, ChatGateway, Event, Result, UserId};
use crate::render::{Button, FormRequest, Reply, Tone};

/// The fixed identity of the console operator.
const CONSOLE_USER: UserId = UserId(0);
/// The fixed channel the console represents.
const CONSOLE_CHANNEL: ChannelId = ChannelId(0);

/// What the next line of input will be interpreted as.
#[derive(Debug, Default)]
enum Pending {
    /// Plain message input.
    #[default]
    None,
    /// A numbered button choice from the last reply.
    Buttons(Vec<Button>),
    /// A form in progress; values collected so far.
    Form {
        request: FormRequest,
        values: Vec<String>,
    },
}

/// Gateway that drives the bot from stdin and prints replies to stdout.
#[derive(Debug)]
pub struct ConsoleGateway {
    prefix: String,
    running: Arc<AtomicBool>,
    pending: Arc<Mutex<Pending>>,
}

impl ConsoleGateway {
    /// Create a console gateway. The prefix is only used for the banner.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            running: Arc::new(AtomicBool::new(false)),
            pending: Arc::new(Mutex::new(Pending::None)),
        }
    }

    fn lock_pending(pending: &Mutex<Pending>) -> std::sync::MutexGuard<'_, Pending> {
        pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Interpret one line of input given the current pending state.
    ///
    /// Returns the event to emit, if any. Form input prints the next field
    /// prompt as a side effect.
    fn interpret_line(pending: &Mutex<Pending>, line: &str) -> Option<Event> {
        let mut state = Self::lock_pending(pending);
        match std::mem::take(&mut *state) {
            Pending::None => Some(Event::Message {
                user: CONSOLE_USER,
                channel: CONSOLE_CHANNEL,
                text: line.to_string(),
            }),
            Pending::Buttons(buttons) => match line.trim().parse::<usize>() {
                Ok(n) if (1..=buttons.len()).contains(&n) => Some(Event::ButtonPressed {
                    user: CONSOLE_USER,
                    channel: CONSOLE_CHANNEL,
                    button: buttons[n - 1].id,
                }),
                // Anything else abandons the choice and reads as a message.
                _ => Some(Event::Message {
                    user: CONSOLE_USER,
                    channel: CONSOLE_CHANNEL,
                    text: line.to_string(),
                }),
            },
            Pending::Form {
                request,
                mut values,
            } => {
                values.push(line.to_string());
                if values.len() == request.fields.len() {
                    Some(Event::FormSubmitted {
                        user: CONSOLE_USER,
                        channel: CONSOLE_CHANNEL,
                        form: request.kind,
                        values,
                    })
                } else {
                    Self::print_field_prompt(&request, values.len());
                    *state = Pending::Form { request, values };
                    None
                }
            }
        }
    }

    fn print_field_prompt(request: &FormRequest, index: usize) {
        let field = &request.fields[index];
        println!("  {} ({}): ", field.label, field.placeholder);
    }

    fn print_reply(reply: &Reply) {
        let marker = match reply.tone {
            Tone::Info => "i",
            Tone::Success => "+",
            Tone::Warning => "!",
            Tone::Error => "x",
        };
        println!("\n[{marker}] {}", reply.title);
        if let Some(body) = &reply.body {
            println!("{body}");
        }
        for field in &reply.fields {
            println!("  {}: {}", field.name, field.value);
        }
        if let Some(footer) = &reply.footer {
            println!("-- {footer}");
        }
    }
}

#[async_trait::async_trait]
impl ChatGateway for ConsoleGateway {
    fn name(&self) -> &'static str {
        "console"
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn start(&mut self, tx: mpsc::Sender<Event>) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(super::GatewayError::AlreadyRunning);
        }

        info!(prefix = %self.prefix, "console gateway started");
        println!(
            "skybook console. Commands start with '{}'; try {}help.",
            self.prefix, self.prefix
        );

        let running = Arc::clone(&self.running);
        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        if let Some(event) = Self::interpret_line(&pending, &line) {
                            if tx.send(event).await.is_err() {
                                debug!("event channel closed, stopping console reader");
                                break;
                            }
                        }
                    }
                    Ok(None) => {
                        info!("stdin closed, stopping console reader");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read from stdin");
                        break;
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    fn stop(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(super::GatewayError::NotRunning);
        }
        info!("console gateway stopped");
        Ok(())
    }

    async fn send(&self, _channel: ChannelId, reply: Reply) -> Result<()> {
        Self::print_reply(&reply);
        Ok(())
    }

    async fn send_with_buttons(
        &self,
        _channel: ChannelId,
        reply: Reply,
        buttons: Vec<Button>,
    ) -> Result<()> {
        Self::print_reply(&reply);
        for (i, button) in buttons.iter().enumerate() {
            println!("  [{}] {}", i + 1, button.label);
        }
        println!("Enter a number to choose:");
        *Self::lock_pending(&self.pending) = Pending::Buttons(buttons);
        Ok(())
    }

    async fn open_form(&self, _user: UserId, _channel: ChannelId, form: FormRequest) -> Result<()> {
        println!("\n=== {} ===", form.title);
        Self::print_field_prompt(&form, 0);
        *Self::lock_pending(&self.pending) = Pending::Form {
            request: form,
            values: Vec::new(),
        };
        Ok(())
    }
}
