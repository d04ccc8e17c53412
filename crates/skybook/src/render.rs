//! Typed responses sent back through the chat gateway.
//!
//! Every command renders through a dedicated builder in this module, so the
//! exact wording and field layout live in one place and can be tested without
//! a gateway. Pagination for the database listing is a pure function here as
//! well.

use crate::booking::{Booking, FormError};
use crate::gateway::{ButtonId, FormKind};

/// Number of display fields one booking consumes in the database listing.
pub const FIELDS_PER_LISTED_BOOKING: usize = 8;

/// Visual tone of a reply, mapped by gateways to colors or markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Neutral informational reply.
    Info,
    /// Something completed successfully.
    Success,
    /// A caution the user should read.
    Warning,
    /// The request could not be fulfilled.
    Error,
}

/// A single name/value pair inside a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyField {
    /// Field label.
    pub name: String,
    /// Field content.
    pub value: String,
    /// Hint that the field may share a row with its neighbors.
    pub inline: bool,
}

/// A formatted response to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply heading.
    pub title: String,
    /// Free-text body shown under the heading.
    pub body: Option<String>,
    /// Structured fields.
    pub fields: Vec<ReplyField>,
    /// Small print at the bottom.
    pub footer: Option<String>,
    /// Visual tone.
    pub tone: Tone,
}

impl Reply {
    /// Create an empty reply with the given title and tone.
    #[must_use]
    pub fn new(title: impl Into<String>, tone: Tone) -> Self {
        Self {
            title: title.into(),
            body: None,
            fields: Vec::new(),
            footer: None,
            tone,
        }
    }

    /// Set the body text.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the footer text.
    #[must_use]
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Append a field.
    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) {
        self.fields.push(ReplyField {
            name: name.into(),
            value: value.into(),
            inline,
        });
    }
}

/// An interactive button attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Stable identifier reported back when pressed.
    pub id: ButtonId,
    /// Label shown to the user.
    pub label: String,
}

/// One input field of a modal form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    /// Field label.
    pub label: String,
    /// Hint text shown in the empty field.
    pub placeholder: String,
}

/// A modal form the gateway should present to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    /// Which form this is; echoed back in the submission event.
    pub kind: FormKind,
    /// Form heading.
    pub title: String,
    /// Input fields in submission order.
    pub fields: Vec<FormField>,
}

fn form_field(label: &str, placeholder: &str) -> FormField {
    FormField {
        label: label.to_string(),
        placeholder: placeholder.to_string(),
    }
}

/// Entry prompt for the booking flow, with start and cancel buttons.
#[must_use]
pub fn booking_entry_prompt() -> (Reply, Vec<Button>) {
    let reply = Reply::new("Flight Ticket Booking", Tone::Info)
        .with_body("Click Start Booking to open the ticket booking form, or Cancel to exit.")
        .with_footer("Choose an option below to proceed.");
    let buttons = vec![
        Button {
            id: ButtonId::StartBooking,
            label: "Start Booking".to_string(),
        },
        Button {
            id: ButtonId::AbortBooking,
            label: "Cancel".to_string(),
        },
    ];
    (reply, buttons)
}

/// The step-one modal form (basic passenger details).
#[must_use]
pub fn basic_details_form() -> FormRequest {
    FormRequest {
        kind: FormKind::BasicDetails,
        title: "Basic Passenger Details".to_string(),
        fields: vec![
            form_field("Passenger Name", "Enter your name"),
            form_field("Age", "Enter your age"),
            form_field("Passport Number", "Enter passport number"),
            form_field("Departure Country", "Enter departure country"),
            form_field("Destination Country", "Enter destination country"),
        ],
    }
}

/// The step-two modal form (additional booking details).
#[must_use]
pub fn travel_details_form() -> FormRequest {
    FormRequest {
        kind: FormKind::TravelDetails,
        title: "Additional Booking Details".to_string(),
        fields: vec![
            form_field("Travel Class", "Business, Economy, First Class"),
            form_field("Price", "Enter price"),
            form_field("Departure Date", "YYYY-MM-DD"),
            form_field("Arrival Date", "YYYY-MM-DD"),
        ],
    }
}

/// Confirmation that the entry prompt was abandoned.
#[must_use]
pub fn booking_aborted() -> Reply {
    Reply::new("Booking Canceled", Tone::Info)
        .with_body("Ticket booking process has been canceled.")
}

/// Acknowledgement of step one, with the button leading to step two.
#[must_use]
pub fn basic_details_received() -> (Reply, Vec<Button>) {
    let reply = Reply::new("Basic Details Received", Tone::Success)
        .with_body("Click the button below to proceed to additional booking details.");
    let buttons = vec![Button {
        id: ButtonId::ProceedToTravelDetails,
        label: "Proceed to Additional Details".to_string(),
    }];
    (reply, buttons)
}

/// Step two was submitted without a stored draft for this user.
#[must_use]
pub fn missing_draft() -> Reply {
    Reply::new("No Basic Details Found", Tone::Error).with_body(
        "Your basic details could not be found. Please start the booking again with the purchase command.",
    )
}

/// A form submission was rejected.
#[must_use]
pub fn form_rejected(err: &FormError) -> Reply {
    Reply::new("Submission Failed", Tone::Error).with_body(err.to_string())
}

/// Confirmation summary after a booking is persisted.
#[must_use]
pub fn booking_confirmation(booking: &Booking) -> Reply {
    let mut reply = Reply::new("Flight Ticket Purchase", Tone::Success)
        .with_body("Ticket successfully booked! Here are your details:")
        .with_footer("Thank you for choosing our service! We hope you have a pleasant journey.");
    reply.push_field("Ticket ID", booking.ticket_id.to_string(), false);
    reply.push_field("Passenger Name", &booking.name, true);
    reply.push_field("From", &booking.from_country, true);
    reply.push_field("To", &booking.to_country, true);
    reply.push_field("Class", &booking.category, true);
    reply.push_field("Price", format!("${}", booking.price), true);
    reply
}

/// Prompt for a ticket ID as a follow-up message.
#[must_use]
pub fn ticket_prompt(action: &str) -> Reply {
    Reply::new("Ticket ID Required", Tone::Info)
        .with_body(format!("Enter your ticket ID to {action}:"))
}

/// Full record detail for a lookup.
#[must_use]
pub fn booking_detail(booking: &Booking) -> Reply {
    let mut reply = Reply::new("Flight Booking Details", Tone::Info);
    reply.push_field("Ticket ID", booking.ticket_id.to_string(), false);
    reply.push_field("Passenger Name", &booking.name, true);
    reply.push_field("Age", booking.age.to_string(), true);
    reply.push_field("Passport Number", &booking.passport, true);
    reply.push_field("From", &booking.from_country, true);
    reply.push_field("To", &booking.to_country, true);
    reply.push_field("Category", &booking.category, true);
    reply.push_field("Price", format!("${}", booking.price), true);
    reply.push_field("Departure Date", &booking.departure_date, true);
    reply.push_field("Arrival Date", &booking.arrival_date, true);
    reply
}

/// The ticket ID was not found in the store.
#[must_use]
pub fn ticket_not_found() -> Reply {
    Reply::new("Not Found", Tone::Error).with_body("Ticket ID not found.")
}

/// Confirmation that a booking was deleted.
#[must_use]
pub fn booking_cancelled() -> Reply {
    Reply::new("Ticket Canceled", Tone::Success)
        .with_body("Your ticket has been canceled. Your refund will be processed shortly.")
}

/// The fixed inquiry menu.
#[must_use]
pub fn inquiry_menu() -> Reply {
    Reply::new("Flight Inquiry Options", Tone::Info)
        .with_body(
            "Please select an option by typing the corresponding number:\n\n\
             1. Flight Arrival - Check the arrival status of your flight.\n\
             2. Flight Delay - Get information on any delays.\n\
             3. Terminal Info - Find out which terminal your flight is arriving at.",
        )
        .with_footer("Type the number of your choice below.")
}

/// Canned response for an inquiry menu selection.
#[must_use]
pub fn inquiry_response(option: &str) -> Reply {
    match option.trim() {
        "1" => Reply::new("Flight Arrival Status", Tone::Success)
            .with_body("The flight is expected to arrive on time."),
        "2" => Reply::new("Flight Delay Information", Tone::Warning)
            .with_body("There is a slight delay in the arrival due to weather conditions."),
        "3" => Reply::new("Terminal Information", Tone::Info)
            .with_body("The flight will arrive at Terminal 3."),
        _ => invalid_option(),
    }
}

/// The fixed support menu.
#[must_use]
pub fn support_menu() -> Reply {
    Reply::new("Support Options", Tone::Info)
        .with_body(
            "Please select an option by typing the corresponding number:\n\n\
             1. Luggage Delay - Report any delays with your luggage.\n\
             2. Missing Items - Report any missing items.\n\
             3. Ticket Postpone - Get help with postponing your ticket.",
        )
        .with_footer("Type the number of your choice below.")
}

/// Canned response for a support menu selection.
#[must_use]
pub fn support_response(option: &str) -> Reply {
    match option.trim() {
        "1" => Reply::new("Luggage Delay Report", Tone::Warning)
            .with_body("Your luggage is delayed but will arrive soon. Thank you for your patience!"),
        "2" => Reply::new("Missing Items Report", Tone::Info).with_body(
            "Please report any missing items to our customer support for further assistance.",
        ),
        "3" => Reply::new("Ticket Postpone Assistance", Tone::Success).with_body(
            "You can postpone your ticket by contacting support. Our team will assist you shortly.",
        ),
        _ => invalid_option(),
    }
}

/// A menu reply that matched none of the offered options.
#[must_use]
pub fn invalid_option() -> Reply {
    Reply::new("Invalid Option", Tone::Error)
        .with_body("Please select a valid option (1, 2, or 3).")
}

/// No reply arrived within the wait window.
#[must_use]
pub fn reply_timeout() -> Reply {
    Reply::new("Timed Out", Tone::Warning)
        .with_body("You took too long to respond! Please try the command again.")
}

/// A prefixed message named no known command.
#[must_use]
pub fn unknown_command(name: &str, prefix: &str) -> Reply {
    Reply::new("Unknown Command", Tone::Error)
        .with_body(format!("Unknown command {name:?}. Try {prefix}help."))
}

/// The database listing is empty.
#[must_use]
pub fn empty_database() -> Reply {
    Reply::new("Flight Bookings Database", Tone::Info)
        .with_body("No bookings in the database.")
}

/// Paginate all bookings into replies bounded by `max_fields` per page.
///
/// Each booking consumes [`FIELDS_PER_LISTED_BOOKING`] display fields; a page
/// always holds at least one booking even if the cap is smaller than that.
#[must_use]
pub fn database_pages(bookings: &[Booking], max_fields: usize) -> Vec<Reply> {
    let per_page = (max_fields / FIELDS_PER_LISTED_BOOKING).max(1);
    bookings
        .chunks(per_page)
        .enumerate()
        .map(|(page, chunk)| {
            let mut reply = if page == 0 {
                Reply::new("Flight Bookings Database", Tone::Info)
                    .with_body("Here are the current bookings in our database:")
            } else {
                Reply::new("Flight Bookings Database (Continued)", Tone::Info)
            };
            for booking in chunk {
                reply.push_field("Ticket ID", booking.ticket_id.to_string(), false);
                reply.push_field("Passenger Name", &booking.name, true);
                reply.push_field("From", &booking.from_country, true);
                reply.push_field("To", &booking.to_country, true);
                reply.push_field("Class", &booking.category, true);
                reply.push_field("Departure", &booking.departure_date, true);
                reply.push_field("Arrival", &booking.arrival_date, true);
                reply.push_field("", "—".repeat(27), false);
            }
            reply
        })
        .collect()
}

/// Static command overview.
#[must_use]
pub fn help(prefix: &str) -> Reply {
    let mut reply = Reply::new("Flight Booking Bot Commands", Tone::Info).with_body(
        "Here is a list of available commands for the Flight Booking Bot. \
         Use these to manage bookings, inquire, and get support!",
    );
    reply.push_field(
        format!("{prefix}purchase"),
        "Book a new flight. The bot will guide you through entering details like destination, category, and price.",
        false,
    );
    reply.push_field(
        format!("{prefix}lookup"),
        "Look up an existing booking by entering your Ticket ID to view all details about your flight.",
        false,
    );
    reply.push_field(
        format!("{prefix}cancel"),
        "Cancel a booking by providing your Ticket ID.",
        false,
    );
    reply.push_field(
        format!("{prefix}inquiry"),
        "Get flight information such as arrival status, delays, and terminal details.",
        false,
    );
    reply.push_field(
        format!("{prefix}support"),
        "Contact support for issues like luggage delay, missing items, or ticket postponement options.",
        false,
    );
    reply.push_field(
        format!("{prefix}show_database"),
        "Display all current bookings in the database. Useful for admins to view existing reservations.",
        false,
    );
    reply.push_field(
        format!("{prefix}help"),
        "Displays this help message, listing all available commands and their descriptions.",
        false,
    );
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::TicketId;

    fn sample_booking(n: usize) -> Booking {
        Booking {
            ticket_id: TicketId::parse(&format!("{:04}AB5C", 1000 + n)).unwrap(),
            name: format!("Passenger {n}"),
            age: 30,
            passport: format!("P{n}"),
            from_country: "US".to_string(),
            to_country: "FR".to_string(),
            category: "Economy".to_string(),
            price: 500,
            departure_date: "2025-01-01".to_string(),
            arrival_date: "2025-01-02".to_string(),
        }
    }

    #[test]
    fn test_booking_entry_prompt_has_two_buttons() {
        let (reply, buttons) = booking_entry_prompt();
        assert_eq!(reply.tone, Tone::Info);
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[0].id, ButtonId::StartBooking);
        assert_eq!(buttons[1].id, ButtonId::AbortBooking);
    }

    #[test]
    fn test_basic_details_form_shape() {
        let form = basic_details_form();
        assert_eq!(form.kind, FormKind::BasicDetails);
        assert_eq!(form.fields.len(), 5);
        assert_eq!(form.fields[0].label, "Passenger Name");
        assert_eq!(form.fields[4].label, "Destination Country");
    }

    #[test]
    fn test_travel_details_form_shape() {
        let form = travel_details_form();
        assert_eq!(form.kind, FormKind::TravelDetails);
        assert_eq!(form.fields.len(), 4);
        assert_eq!(form.fields[1].label, "Price");
    }

    #[test]
    fn test_booking_confirmation_fields() {
        let booking = sample_booking(1);
        let reply = booking_confirmation(&booking);

        assert_eq!(reply.tone, Tone::Success);
        assert_eq!(reply.fields[0].name, "Ticket ID");
        assert_eq!(reply.fields[0].value, booking.ticket_id.to_string());
        assert!(reply
            .fields
            .iter()
            .any(|f| f.name == "Price" && f.value == "$500"));
    }

    #[test]
    fn test_booking_detail_has_all_ten_fields() {
        let booking = sample_booking(1);
        let reply = booking_detail(&booking);
        assert_eq!(reply.fields.len(), 10);
        assert!(reply
            .fields
            .iter()
            .any(|f| f.name == "Departure Date" && f.value == "2025-01-01"));
        assert!(reply
            .fields
            .iter()
            .any(|f| f.name == "Arrival Date" && f.value == "2025-01-02"));
    }

    #[test]
    fn test_inquiry_response_options() {
        assert_eq!(inquiry_response("1").tone, Tone::Success);
        assert_eq!(inquiry_response("2").tone, Tone::Warning);
        assert_eq!(inquiry_response("3").tone, Tone::Info);
        assert_eq!(inquiry_response("4"), invalid_option());
        assert_eq!(inquiry_response("nonsense"), invalid_option());
    }

    #[test]
    fn test_inquiry_response_trims_whitespace() {
        assert_eq!(inquiry_response(" 1 ").tone, Tone::Success);
    }

    #[test]
    fn test_support_response_options() {
        assert_eq!(support_response("1").tone, Tone::Warning);
        assert_eq!(support_response("2").tone, Tone::Info);
        assert_eq!(support_response("3").tone, Tone::Success);
        assert_eq!(support_response("0"), invalid_option());
    }

    #[test]
    fn test_database_pages_split() {
        // 10 records at 8 fields each with a cap of 25 fields per page:
        // 3 records fit per page, so 3 full pages plus 1 partial.
        let bookings: Vec<Booking> = (0..10).map(sample_booking).collect();
        let pages = database_pages(&bookings, 25);

        assert_eq!(pages.len(), 4);
        assert_eq!(pages[0].fields.len(), 3 * FIELDS_PER_LISTED_BOOKING);
        assert_eq!(pages[1].fields.len(), 3 * FIELDS_PER_LISTED_BOOKING);
        assert_eq!(pages[2].fields.len(), 3 * FIELDS_PER_LISTED_BOOKING);
        assert_eq!(pages[3].fields.len(), FIELDS_PER_LISTED_BOOKING);
        assert_eq!(pages[0].title, "Flight Bookings Database");
        assert_eq!(pages[1].title, "Flight Bookings Database (Continued)");
    }

    #[test]
    fn test_database_pages_preserve_insertion_order() {
        let bookings: Vec<Booking> = (0..10).map(sample_booking).collect();
        let pages = database_pages(&bookings, 25);

        let listed_ids: Vec<&str> = pages
            .iter()
            .flat_map(|p| &p.fields)
            .filter(|f| f.name == "Ticket ID")
            .map(|f| f.value.as_str())
            .collect();
        let expected: Vec<String> = bookings
            .iter()
            .map(|b| b.ticket_id.to_string())
            .collect();
        assert_eq!(
            listed_ids,
            expected.iter().map(String::as_str).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_database_pages_single_page() {
        let bookings: Vec<Booking> = (0..2).map(sample_booking).collect();
        let pages = database_pages(&bookings, 25);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].fields.len(), 2 * FIELDS_PER_LISTED_BOOKING);
    }

    #[test]
    fn test_database_pages_tiny_cap_still_progresses() {
        let bookings: Vec<Booking> = (0..3).map(sample_booking).collect();
        let pages = database_pages(&bookings, 1);
        assert_eq!(pages.len(), 3);
    }

    #[test]
    fn test_database_pages_empty() {
        assert!(database_pages(&[], 25).is_empty());
    }

    #[test]
    fn test_help_lists_all_commands() {
        let reply = help("!");
        let names: Vec<&str> = reply.fields.iter().map(|f| f.name.as_str()).collect();
        for cmd in [
            "!purchase",
            "!lookup",
            "!cancel",
            "!inquiry",
            "!support",
            "!show_database",
            "!help",
        ] {
            assert!(names.contains(&cmd), "missing help entry for {cmd}");
        }
    }

    #[test]
    fn test_unknown_command_mentions_help() {
        let reply = unknown_command("frobnicate", "!");
        assert!(reply.body.as_deref().unwrap().contains("!help"));
    }

    #[test]
    fn test_form_rejected_carries_message() {
        let err = FormError::NotANumber {
            field: "age",
            value: "abc".to_string(),
        };
        let reply = form_rejected(&err);
        assert_eq!(reply.tone, Tone::Error);
        assert!(reply.body.as_deref().unwrap().contains("age"));
    }

    #[test]
    fn test_reply_builder() {
        let mut reply = Reply::new("Title", Tone::Info)
            .with_body("Body")
            .with_footer("Footer");
        reply.push_field("Name", "Value", true);

        assert_eq!(reply.title, "Title");
        assert_eq!(reply.body.as_deref(), Some("Body"));
        assert_eq!(reply.footer.as_deref(), Some("Footer"));
        assert_eq!(reply.fields.len(), 1);
        assert!(reply.fields[0].inline);
    }
}
