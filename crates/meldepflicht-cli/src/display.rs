//! Text rendering for determinations, deadlines and accident reports.
//!
//! Reports are printed as a vertical card grouped by form section, in schema
//! order, skipping sections with nothing filled in.

use meldepflicht_core::schema::{FORM_SCHEMA, SectionSchema};
use meldepflicht_core::{
    CARRIERS, Carrier, Deadline, DeadlineKind, Determination, GeneratedForm, NO_COMPUTED_DEADLINE,
    ValidationResult,
};
use serde::Serialize;

const MAX_LIST_ITEMS: usize = 10;

// ── JSON ──

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Evaluation ──

pub fn print_determination(determination: &Determination) {
    let verdict = match (
        determination.is_mandatory,
        determination.immediate_notification_required,
    ) {
        (_, true) => "meldepflichtig (sofort)",
        (true, false) => "meldepflichtig",
        (false, false) => "nicht meldepflichtig",
    };
    println!("=== Meldepflicht ===");
    println!("  {:<26} {}", "Ergebnis", verdict);
    println!();

    for result in &determination.authority_results {
        println!("{}", result.authority.name);
        let deadline = if result.immediate_required || result.authority.deadline.hours().is_some() {
            result.authority.deadline.label()
        } else {
            NO_COMPUTED_DEADLINE
        };
        println!("  {:<26} {}", "Frist", deadline);
        if result.immediate_required {
            println!("  {:<26} ja", "Sofortmeldung");
        }
        for criterion in &result.matched_criteria {
            println!("  {:<26} {}", criterion.id, criterion.description);
            println!("  {:<26} {}", "", criterion.legal_basis);
        }
        println!();
    }

    if !determination.distinct_legal_bases.is_empty() {
        println!("Rechtsgrundlagen");
        for basis in &determination.distinct_legal_bases {
            println!("  {basis}");
        }
        println!();
    }
}

pub fn print_deadlines(deadlines: &[Deadline]) {
    if deadlines.is_empty() {
        println!("Keine Meldefristen.");
        return;
    }
    println!("=== Meldefristen ===");
    for deadline in deadlines {
        let kind = match deadline.kind {
            DeadlineKind::Immediate => "sofort",
            DeadlineKind::Scheduled => "fristgebunden",
        };
        match deadline.due_at {
            Some(due) => println!(
                "  {:<26} {}  ({kind}, {} h)",
                deadline.authority_name,
                due.to_rfc3339(),
                deadline.hours_allotted.unwrap_or_default()
            ),
            None => println!(
                "  {:<26} {NO_COMPUTED_DEADLINE} ({kind})",
                deadline.authority_name
            ),
        }
    }
}

// ── Accident report ──

pub fn print_form(form: &GeneratedForm) {
    println!("=== {} {} ===", form.header.form_type, form.header.version);
    if let Some(reference) = &form.header.reference {
        println!("Referenz {reference}");
    }
    println!("Erstellt {}", form.header.generated_at.to_rfc3339());
    println!();

    if form.error {
        println!(
            "Fehler bei der Erstellung: {}",
            form.message.as_deref().unwrap_or("unbekannt")
        );
        return;
    }

    match form.carrier {
        Some(carrier) => println!("Träger: {} ({})", carrier.display_name, carrier.code),
        None => println!("Träger: nicht ermittelt"),
    }
    println!();

    for section in FORM_SCHEMA {
        print_section(form, section);
    }
    print_validation(&form.validation);

    if let Some(compliance) = &form.compliance {
        println!();
        print_determination(compliance);
    }
}

fn print_section(form: &GeneratedForm, schema: &SectionSchema) {
    let has_data = schema
        .fields
        .iter()
        .any(|f| form.sections.get(schema.id, f.key).is_some_and(|v| v.is_filled()));
    if !has_data {
        return;
    }

    println!("{}", schema.title);
    for field in schema.fields {
        let Some(value) = form.sections.get(schema.id, field.key) else {
            continue;
        };
        if !value.is_filled() {
            continue;
        }
        let text = value.to_string();
        let mut lines = text.lines();
        if let Some(first) = lines.next() {
            println!("  {:<26} {}", field.key, first);
        }
        for line in lines {
            println!("  {:<26} {}", "", line);
        }
    }
    println!();
}

pub fn print_validation(validation: &ValidationResult) {
    println!("Prüfung");
    println!(
        "  {:<26} {}",
        "gültig",
        if validation.is_valid { "ja" } else { "nein" }
    );
    println!("  {:<26} {} %", "Vollständigkeit", validation.completeness_percent);
    print_messages("Fehler", &validation.errors);
    print_messages("Hinweise", &validation.warnings);
}

fn print_messages(header: &str, messages: &[String]) {
    if messages.is_empty() {
        return;
    }
    println!("  {} ({}):", header, messages.len());
    let show = messages.len().min(MAX_LIST_ITEMS);
    for message in &messages[..show] {
        println!("    {message}");
    }
    if messages.len() > MAX_LIST_ITEMS {
        println!("    ... und {} weitere", messages.len() - MAX_LIST_ITEMS);
    }
}

// ── Reference tables ──

pub fn print_carrier(membership_id: &str, carrier: Option<&Carrier>) {
    match carrier {
        Some(c) => {
            println!("{}", c.display_name);
            println!("  {:<26} {}", "Kennung", c.code);
            println!("  {:<26} {}", "Anschrift", c.address);
        }
        None => println!("Kein Träger für Mitgliedsnummer \"{}\".", membership_id.trim()),
    }
}

pub fn print_carriers() {
    for c in CARRIERS {
        println!(
            "  {:<6} {:<10} {}",
            c.code,
            format!("{}{}", c.membership.prefix, "#".repeat(c.membership.digits)),
            c.display_name
        );
    }
}

pub fn print_schema() {
    for section in FORM_SCHEMA {
        println!("{} ({})", section.title, section.id);
        for field in section.fields {
            print!(
                "  {:<26} {:<8}",
                field.key,
                field.field_type.as_str()
            );
            if field.required {
                print!(" Pflicht");
            }
            if let Some(max) = field.max_length {
                print!(" max {max}");
            }
            if let Some(allowed) = field.allowed_values {
                print!(" [{}]", allowed.join(", "));
            }
            println!();
        }
        println!();
    }
}
