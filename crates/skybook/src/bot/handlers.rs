//! Event handlers.
//!
//! One function per command plus the two form-submission steps. Every
//! handler takes the shared [`Context`] and speaks to the user only through
//! the gateway, so the whole surface is testable against a recording fake.

use std::sync::MutexGuard;

use tracing::{debug, info, trace, warn};

use super::{Command, Context};
use crate::booking::{BasicDetailsForm, Booking, TravelDetailsForm};
use crate::error::{Error, Result};
use crate::gateway::{ButtonId, ChannelId, Event, FormKind, UserId};
use crate::render;
use crate::storage::Store;
use crate::ticket::TicketId;

/// How many random draws to try before giving up on a unique ticket ID.
const MAX_TICKET_ATTEMPTS: u32 = 16;

/// Route one gateway event to its handler.
///
/// # Errors
///
/// Returns an error if a handler fails; the caller logs it and carries on.
pub async fn handle_event(ctx: &Context, event: Event) -> Result<()> {
    match event {
        Event::Message {
            user,
            channel,
            text,
        } => handle_message(ctx, user, channel, &text).await,
        Event::ButtonPressed {
            user,
            channel,
            button,
        } => handle_button(ctx, user, channel, button).await,
        Event::FormSubmitted {
            user,
            channel,
            form,
            values,
        } => match form {
            FormKind::BasicDetails => submit_basic_details(ctx, user, channel, &values).await,
            FormKind::TravelDetails => submit_travel_details(ctx, user, channel, &values).await,
        },
    }
}

async fn handle_message(
    ctx: &Context,
    user: UserId,
    channel: ChannelId,
    text: &str,
) -> Result<()> {
    match Command::parse(text, &ctx.config.bot.command_prefix) {
        Some(Ok(command)) => {
            info!(%user, ?command, "handling command");
            match command {
                Command::Purchase => purchase(ctx, channel).await,
                Command::Lookup => lookup(ctx, user, channel).await,
                Command::Cancel => cancel(ctx, user, channel).await,
                Command::Inquiry => inquiry(ctx, user, channel).await,
                Command::Support => support(ctx, user, channel).await,
                Command::ShowDatabase => show_database(ctx, channel).await,
                Command::Help => help(ctx, channel).await,
            }
        }
        Some(Err(name)) => {
            debug!(%user, name, "unknown command");
            ctx.gateway
                .send(
                    channel,
                    render::unknown_command(name, &ctx.config.bot.command_prefix),
                )
                .await?;
            Ok(())
        }
        None => {
            // Not a command. Offer it to any waiting lookup/cancel/menu.
            if !ctx.waiters.deliver(user, text.to_string()) {
                trace!(%user, "ignoring plain message with no waiter");
            }
            Ok(())
        }
    }
}

async fn handle_button(
    ctx: &Context,
    user: UserId,
    channel: ChannelId,
    button: ButtonId,
) -> Result<()> {
    match button {
        ButtonId::StartBooking => {
            ctx.gateway
                .open_form(user, channel, render::basic_details_form())
                .await?;
        }
        ButtonId::AbortBooking => {
            ctx.gateway.send(channel, render::booking_aborted()).await?;
        }
        ButtonId::ProceedToTravelDetails => {
            // Refuse to open step two for a user with no live draft.
            if ctx.sessions.contains(user) {
                ctx.gateway
                    .open_form(user, channel, render::travel_details_form())
                    .await?;
            } else {
                warn!(%user, "travel details requested without a draft");
                ctx.gateway.send(channel, render::missing_draft()).await?;
            }
        }
    }
    Ok(())
}

async fn purchase(ctx: &Context, channel: ChannelId) -> Result<()> {
    let (reply, buttons) = render::booking_entry_prompt();
    ctx.gateway
        .send_with_buttons(channel, reply, buttons)
        .await?;
    Ok(())
}

async fn submit_basic_details(
    ctx: &Context,
    user: UserId,
    channel: ChannelId,
    values: &[String],
) -> Result<()> {
    let draft = match BasicDetailsForm::from_values(values).and_then(BasicDetailsForm::parse) {
        Ok(draft) => draft,
        Err(err) => {
            debug!(%user, error = %err, "rejected basic details form");
            ctx.gateway.send(channel, render::form_rejected(&err)).await?;
            return Ok(());
        }
    };

    ctx.sessions.insert(user, draft);
    let (reply, buttons) = render::basic_details_received();
    ctx.gateway
        .send_with_buttons(channel, reply, buttons)
        .await?;
    Ok(())
}

async fn submit_travel_details(
    ctx: &Context,
    user: UserId,
    channel: ChannelId,
    values: &[String],
) -> Result<()> {
    // Validate before consuming the draft so a typo does not destroy step one.
    let travel = match TravelDetailsForm::from_values(values).and_then(TravelDetailsForm::parse) {
        Ok(travel) => travel,
        Err(err) => {
            debug!(%user, error = %err, "rejected travel details form");
            ctx.gateway.send(channel, render::form_rejected(&err)).await?;
            return Ok(());
        }
    };

    let Some(draft) = ctx.sessions.take(user) else {
        warn!(%user, "travel details submitted without a draft");
        ctx.gateway.send(channel, render::missing_draft()).await?;
        return Ok(());
    };

    let booking = {
        let store = lock_store(ctx);
        let ticket_id = allocate_ticket_id(&store)?;
        let booking = Booking::from_parts(ticket_id, draft, travel);
        store.create(&booking)?;
        booking
    };

    info!(%user, ticket_id = %booking.ticket_id, "booking created");
    ctx.gateway
        .send(channel, render::booking_confirmation(&booking))
        .await?;
    Ok(())
}

/// Draw ticket IDs until one is unused.
///
/// Runs under the store lock held by the caller so a concurrent booking
/// cannot claim the ID between the check and the insert.
fn allocate_ticket_id(store: &Store) -> Result<TicketId> {
    for _ in 0..MAX_TICKET_ATTEMPTS {
        let candidate = TicketId::generate();
        if !store.exists(&candidate)? {
            return Ok(candidate);
        }
        debug!(ticket_id = %candidate, "ticket ID collision, retrying");
    }
    Err(Error::TicketIdExhausted {
        attempts: MAX_TICKET_ATTEMPTS,
    })
}

async fn lookup(ctx: &Context, user: UserId, channel: ChannelId) -> Result<()> {
    ctx.gateway
        .send(channel, render::ticket_prompt("look up"))
        .await?;

    let Some(text) = ctx
        .waiters
        .await_reply(user, ctx.config.reply_timeout())
        .await
    else {
        ctx.gateway.send(channel, render::reply_timeout()).await?;
        return Ok(());
    };

    let Ok(ticket_id) = TicketId::parse(text.trim()) else {
        ctx.gateway.send(channel, render::ticket_not_found()).await?;
        return Ok(());
    };

    let found = lock_store(ctx).find(&ticket_id)?;
    match found {
        Some(booking) => {
            ctx.gateway
                .send(channel, render::booking_detail(&booking))
                .await?;
        }
        None => {
            ctx.gateway.send(channel, render::ticket_not_found()).await?;
        }
    }
    Ok(())
}

async fn cancel(ctx: &Context, user: UserId, channel: ChannelId) -> Result<()> {
    ctx.gateway
        .send(channel, render::ticket_prompt("cancel"))
        .await?;

    let Some(text) = ctx
        .waiters
        .await_reply(user, ctx.config.reply_timeout())
        .await
    else {
        ctx.gateway.send(channel, render::reply_timeout()).await?;
        return Ok(());
    };

    let Ok(ticket_id) = TicketId::parse(text.trim()) else {
        ctx.gateway.send(channel, render::ticket_not_found()).await?;
        return Ok(());
    };

    let deleted = lock_store(ctx).delete(&ticket_id)?;
    if deleted {
        info!(%user, %ticket_id, "booking cancelled");
        ctx.gateway
            .send(channel, render::booking_cancelled())
            .await?;
    } else {
        ctx.gateway.send(channel, render::ticket_not_found()).await?;
    }
    Ok(())
}

async fn inquiry(ctx: &Context, user: UserId, channel: ChannelId) -> Result<()> {
    ctx.gateway.send(channel, render::inquiry_menu()).await?;

    match ctx
        .waiters
        .await_reply(user, ctx.config.menu_timeout())
        .await
    {
        Some(choice) => {
            ctx.gateway
                .send(channel, render::inquiry_response(&choice))
                .await?;
        }
        None => {
            ctx.gateway.send(channel, render::reply_timeout()).await?;
        }
    }
    Ok(())
}

async fn support(ctx: &Context, user: UserId, channel: ChannelId) -> Result<()> {
    ctx.gateway.send(channel, render::support_menu()).await?;

    match ctx
        .waiters
        .await_reply(user, ctx.config.menu_timeout())
        .await
    {
        Some(choice) => {
            ctx.gateway
                .send(channel, render::support_response(&choice))
                .await?;
        }
        None => {
            ctx.gateway.send(channel, render::reply_timeout()).await?;
        }
    }
    Ok(())
}

async fn show_database(ctx: &Context, channel: ChannelId) -> Result<()> {
    let bookings = lock_store(ctx).list_all()?;
    if bookings.is_empty() {
        ctx.gateway.send(channel, render::empty_database()).await?;
        return Ok(());
    }

    let pages = render::database_pages(&bookings, ctx.config.display.max_fields_per_page);
    debug!(records = bookings.len(), pages = pages.len(), "listing database");
    for page in pages {
        ctx.gateway.send(channel, page).await?;
    }
    Ok(())
}

async fn help(ctx: &Context, channel: ChannelId) -> Result<()> {
    ctx.gateway
        .send(channel, render::help(&ctx.config.bot.command_prefix))
        .await?;
    Ok(())
}

fn lock_store(ctx: &Context) -> MutexGuard<'_, Store> {
    ctx.store
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::config::Config;
    use crate::gateway::testing::{Outgoing, RecordingGateway};
    use crate::render::Tone;
    use crate::session::SessionStore;
    use crate::waiter::ReplyWaiters;

    const USER: UserId = UserId(1);
    const CHANNEL: ChannelId = ChannelId(10);

    struct Fixture {
        ctx: Context,
        gateway: Arc<RecordingGateway>,
    }

    fn fixture() -> Fixture {
        let gateway = Arc::new(RecordingGateway::new());
        let config = Arc::new(Config::default());
        let ctx = Context {
            gateway: Arc::clone(&gateway) as Arc<dyn crate::gateway::ChatGateway>,
            store: Arc::new(Mutex::new(Store::open_in_memory().unwrap())),
            sessions: Arc::new(SessionStore::new(config.draft_ttl())),
            waiters: Arc::new(ReplyWaiters::new()),
            config,
        };
        Fixture { ctx, gateway }
    }

    fn message(text: &str) -> Event {
        Event::Message {
            user: USER,
            channel: CHANNEL,
            text: text.to_string(),
        }
    }

    fn basic_values() -> Vec<String> {
        vec![
            "Alice".to_string(),
            "30".to_string(),
            "P1234567".to_string(),
            "USA".to_string(),
            "France".to_string(),
        ]
    }

    fn sample_booking(n: usize) -> Booking {
        Booking {
            ticket_id: TicketId::parse(&format!("{n:04}AB5C")).unwrap(),
            name: format!("Passenger {n}"),
            age: 40,
            passport: format!("P{n:07}"),
            from_country: "USA".to_string(),
            to_country: "Japan".to_string(),
            category: "Economy".to_string(),
            price: 700,
            departure_date: "2026-10-01".to_string(),
            arrival_date: "2026-10-02".to_string(),
        }
    }

    fn travel_values() -> Vec<String> {
        vec![
            "Economy".to_string(),
            "450".to_string(),
            "2026-09-01".to_string(),
            "2026-09-02".to_string(),
        ]
    }

    /// Drive the whole happy-path booking flow for one user.
    async fn book(fx: &Fixture) -> Booking {
        handle_event(&fx.ctx, message("!purchase")).await.unwrap();
        handle_event(
            &fx.ctx,
            Event::ButtonPressed {
                user: USER,
                channel: CHANNEL,
                button: ButtonId::StartBooking,
            },
        )
        .await
        .unwrap();
        handle_event(
            &fx.ctx,
            Event::FormSubmitted {
                user: USER,
                channel: CHANNEL,
                form: FormKind::BasicDetails,
                values: basic_values(),
            },
        )
        .await
        .unwrap();
        handle_event(
            &fx.ctx,
            Event::ButtonPressed {
                user: USER,
                channel: CHANNEL,
                button: ButtonId::ProceedToTravelDetails,
            },
        )
        .await
        .unwrap();
        handle_event(
            &fx.ctx,
            Event::FormSubmitted {
                user: USER,
                channel: CHANNEL,
                form: FormKind::TravelDetails,
                values: travel_values(),
            },
        )
        .await
        .unwrap();

        let bookings = fx.ctx.store.lock().unwrap().list_all().unwrap();
        bookings.into_iter().next_back().unwrap()
    }

    #[tokio::test]
    async fn test_full_booking_flow() {
        let fx = fixture();
        let booking = book(&fx).await;

        assert_eq!(booking.name, "Alice");
        assert_eq!(booking.age, 30);
        assert_eq!(booking.price, 450);
        assert_eq!(booking.ticket_id.as_str().len(), 8);

        // Draft consumed on completion
        assert!(fx.ctx.sessions.is_empty());

        // Last outgoing is the confirmation
        let sent = fx.gateway.sent();
        let Outgoing::Reply(channel, reply) = sent.last().unwrap() else {
            panic!("expected a confirmation reply");
        };
        assert_eq!(*channel, CHANNEL);
        assert_eq!(reply.tone, Tone::Success);
        assert!(reply
            .fields
            .iter()
            .any(|f| f.value == booking.ticket_id.as_str()));
    }

    #[tokio::test]
    async fn test_purchase_sends_entry_buttons() {
        let fx = fixture();
        handle_event(&fx.ctx, message("!purchase")).await.unwrap();

        let sent = fx.gateway.sent();
        assert_eq!(sent.len(), 1);
        let Outgoing::Buttons(_, _, buttons) = &sent[0] else {
            panic!("expected buttons");
        };
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[0].id, ButtonId::StartBooking);
        assert_eq!(buttons[1].id, ButtonId::AbortBooking);
    }

    #[tokio::test]
    async fn test_abort_button_sends_aborted_reply() {
        let fx = fixture();
        handle_event(
            &fx.ctx,
            Event::ButtonPressed {
                user: USER,
                channel: CHANNEL,
                button: ButtonId::AbortBooking,
            },
        )
        .await
        .unwrap();

        let sent = fx.gateway.sent();
        assert!(matches!(&sent[0], Outgoing::Reply(_, r) if r.tone == Tone::Warning));
        assert!(fx.ctx.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_travel_details_without_draft_is_refused() {
        let fx = fixture();
        handle_event(
            &fx.ctx,
            Event::ButtonPressed {
                user: USER,
                channel: CHANNEL,
                button: ButtonId::ProceedToTravelDetails,
            },
        )
        .await
        .unwrap();

        let sent = fx.gateway.sent();
        assert_eq!(sent.len(), 1);
        // An error reply, not a form
        assert!(matches!(&sent[0], Outgoing::Reply(_, r) if r.tone == Tone::Error));
    }

    #[tokio::test]
    async fn test_travel_form_without_draft_is_refused() {
        let fx = fixture();
        handle_event(
            &fx.ctx,
            Event::FormSubmitted {
                user: USER,
                channel: CHANNEL,
                form: FormKind::TravelDetails,
                values: travel_values(),
            },
        )
        .await
        .unwrap();

        let sent = fx.gateway.sent();
        assert!(matches!(&sent[0], Outgoing::Reply(_, r) if r.tone == Tone::Error));
        assert_eq!(fx.ctx.store.lock().unwrap().count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bad_age_rejects_form_and_keeps_no_draft() {
        let fx = fixture();
        let mut values = basic_values();
        values[1] = "thirty".to_string();

        handle_event(
            &fx.ctx,
            Event::FormSubmitted {
                user: USER,
                channel: CHANNEL,
                form: FormKind::BasicDetails,
                values,
            },
        )
        .await
        .unwrap();

        let sent = fx.gateway.sent();
        assert!(matches!(&sent[0], Outgoing::Reply(_, r) if r.tone == Tone::Error));
        assert!(fx.ctx.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_bad_price_preserves_draft_for_retry() {
        let fx = fixture();
        handle_event(
            &fx.ctx,
            Event::FormSubmitted {
                user: USER,
                channel: CHANNEL,
                form: FormKind::BasicDetails,
                values: basic_values(),
            },
        )
        .await
        .unwrap();

        let mut values = travel_values();
        values[1] = "a lot".to_string();
        handle_event(
            &fx.ctx,
            Event::FormSubmitted {
                user: USER,
                channel: CHANNEL,
                form: FormKind::TravelDetails,
                values,
            },
        )
        .await
        .unwrap();

        // Draft survives the rejected step two
        assert!(fx.ctx.sessions.contains(USER));
        assert_eq!(fx.ctx.store.lock().unwrap().count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lookup_round_trip() {
        let fx = fixture();
        let booking = book(&fx).await;

        let ctx = fx.ctx.clone();
        let task = tokio::spawn(async move {
            handle_event(&ctx, message("!lookup")).await.unwrap();
        });

        // Wait for the prompt, then answer with the ticket ID.
        while !fx
            .ctx
            .waiters
            .deliver(USER, booking.ticket_id.as_str().to_string())
        {
            tokio::task::yield_now().await;
        }
        task.await.unwrap();

        let sent = fx.gateway.sent();
        let Outgoing::Reply(_, reply) = sent.last().unwrap() else {
            panic!("expected a reply");
        };
        assert!(reply.fields.iter().any(|f| f.value == "Alice"));
    }

    #[tokio::test]
    async fn test_lookup_unknown_ticket() {
        let fx = fixture();

        let ctx = fx.ctx.clone();
        let task = tokio::spawn(async move {
            handle_event(&ctx, message("!lookup")).await.unwrap();
        });

        while !fx.ctx.waiters.deliver(USER, "9999ZZ9Z".to_string()) {
            tokio::task::yield_now().await;
        }
        task.await.unwrap();

        let sent = fx.gateway.sent();
        assert!(matches!(sent.last().unwrap(), Outgoing::Reply(_, r) if r.tone == Tone::Error));
    }

    #[tokio::test]
    async fn test_lookup_malformed_ticket_reports_not_found() {
        let fx = fixture();

        let ctx = fx.ctx.clone();
        let task = tokio::spawn(async move {
            handle_event(&ctx, message("!lookup")).await.unwrap();
        });

        while !fx.ctx.waiters.deliver(USER, "not-a-ticket".to_string()) {
            tokio::task::yield_now().await;
        }
        task.await.unwrap();

        let sent = fx.gateway.sent();
        assert!(matches!(sent.last().unwrap(), Outgoing::Reply(_, r) if r.tone == Tone::Error));
    }

    #[tokio::test]
    async fn test_cancel_deletes_booking() {
        let fx = fixture();
        let booking = book(&fx).await;

        let ctx = fx.ctx.clone();
        let task = tokio::spawn(async move {
            handle_event(&ctx, message("!cancel")).await.unwrap();
        });

        while !fx
            .ctx
            .waiters
            .deliver(USER, booking.ticket_id.as_str().to_string())
        {
            tokio::task::yield_now().await;
        }
        task.await.unwrap();

        assert_eq!(fx.ctx.store.lock().unwrap().count().unwrap(), 0);
        let sent = fx.gateway.sent();
        assert!(matches!(sent.last().unwrap(), Outgoing::Reply(_, r) if r.tone == Tone::Success));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_times_out() {
        let fx = fixture();
        handle_event(&fx.ctx, message("!lookup")).await.unwrap();

        let sent = fx.gateway.sent();
        assert_eq!(sent.len(), 2);
        assert!(matches!(&sent[1], Outgoing::Reply(_, r) if r.title.contains("Timed Out")));
        assert!(fx.ctx.waiters.is_empty());
    }

    #[tokio::test]
    async fn test_inquiry_valid_and_invalid_options() {
        let fx = fixture();

        for (answer, expect_invalid) in [("1", false), (" 2 ", false), ("4", true)] {
            let ctx = fx.ctx.clone();
            let task = tokio::spawn(async move {
                handle_event(&ctx, message("!inquiry")).await.unwrap();
            });
            while !fx.ctx.waiters.deliver(USER, answer.to_string()) {
                tokio::task::yield_now().await;
            }
            task.await.unwrap();

            let sent = fx.gateway.sent();
            let Outgoing::Reply(_, reply) = sent.last().unwrap() else {
                panic!("expected a reply");
            };
            assert_eq!(reply.tone == Tone::Error, expect_invalid, "answer {answer:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_support_menu_times_out() {
        let fx = fixture();
        handle_event(&fx.ctx, message("!support")).await.unwrap();

        let sent = fx.gateway.sent();
        assert_eq!(sent.len(), 2);
        assert!(matches!(&sent[1], Outgoing::Reply(_, r) if r.title.contains("Timed Out")));
    }

    #[tokio::test]
    async fn test_show_database_empty() {
        let fx = fixture();
        handle_event(&fx.ctx, message("!show_database")).await.unwrap();

        let sent = fx.gateway.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], Outgoing::Reply(_, r) if r.fields.is_empty()));
    }

    #[tokio::test]
    async fn test_show_database_paginates() {
        let fx = fixture();
        {
            let store = fx.ctx.store.lock().unwrap();
            for n in 0..7 {
                store.create(&sample_booking(n)).unwrap();
            }
        }

        handle_event(&fx.ctx, message("!show_database")).await.unwrap();

        // 25 fields / 8 per record = 3 records per page; 7 records = 3 pages
        let sent = fx.gateway.sent();
        assert_eq!(sent.len(), 3);
        for page in &sent {
            let Outgoing::Reply(_, reply) = page else {
                panic!("expected plain replies");
            };
            assert!(reply.fields.len() <= fx.ctx.config.display.max_fields_per_page);
        }
    }

    #[tokio::test]
    async fn test_unknown_command_gets_a_reply() {
        let fx = fixture();
        handle_event(&fx.ctx, message("!frobnicate")).await.unwrap();

        let sent = fx.gateway.sent();
        assert_eq!(sent.len(), 1);
        let Outgoing::Reply(_, reply) = &sent[0] else {
            panic!("expected a reply");
        };
        assert!(reply.body.as_deref().unwrap_or("").contains("frobnicate"));
    }

    #[tokio::test]
    async fn test_plain_message_without_waiter_is_ignored() {
        let fx = fixture();
        handle_event(&fx.ctx, message("just chatting")).await.unwrap();

        assert!(fx.gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_help_lists_all_commands() {
        let fx = fixture();
        handle_event(&fx.ctx, message("!help")).await.unwrap();

        let sent = fx.gateway.sent();
        let Outgoing::Reply(_, reply) = &sent[0] else {
            panic!("expected a reply");
        };
        for name in [
            "purchase",
            "lookup",
            "cancel",
            "inquiry",
            "support",
            "show_database",
            "help",
        ] {
            assert!(
                reply.fields.iter().any(|f| f.name.contains(name)),
                "missing {name}"
            );
        }
    }

    #[tokio::test]
    async fn test_expired_draft_blocks_step_two() {
        let fx = fixture();
        let ctx = Context {
            sessions: Arc::new(SessionStore::new(Duration::ZERO)),
            ..fx.ctx.clone()
        };

        handle_event(
            &ctx,
            Event::FormSubmitted {
                user: USER,
                channel: CHANNEL,
                form: FormKind::BasicDetails,
                values: basic_values(),
            },
        )
        .await
        .unwrap();
        handle_event(
            &ctx,
            Event::ButtonPressed {
                user: USER,
                channel: CHANNEL,
                button: ButtonId::ProceedToTravelDetails,
            },
        )
        .await
        .unwrap();

        let sent = fx.gateway.sent();
        // Step one ack, then the missing-draft error
        assert!(matches!(sent.last().unwrap(), Outgoing::Reply(_, r) if r.tone == Tone::Error));
    }
}
