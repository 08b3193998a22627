use almwork_domain::{CreateWorkItem, PartialFields, UpdateWorkItem, WorkItemFields};

const TITLE_MIN: usize = 5;
const TITLE_MAX: usize = 500;
const PRIORITY_MIN: u8 = 1;
const PRIORITY_MAX: u8 = 5;
const FMEA_MIN: u8 = 1;
const FMEA_MAX: u8 = 10;

fn validate_title(title: &str, errors: &mut Vec<String>) {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        errors.push("title must not be blank".into());
        return;
    }
    let len = trimmed.chars().count();
    if !(TITLE_MIN..=TITLE_MAX).contains(&len) {
        errors.push(format!(
            "title must be between {TITLE_MIN} and {TITLE_MAX} characters, got {len}"
        ));
    }
}

/// Trims surrounding whitespace from a title before it is stored, so a
/// title that validated as non-blank never persists its leading/trailing
/// whitespace either.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title.trim().to_string()
}

fn validate_priority(priority: Option<u8>, errors: &mut Vec<String>) {
    if let Some(p) = priority {
        if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&p) {
            errors.push(format!(
                "priority must be between {PRIORITY_MIN} and {PRIORITY_MAX}, got {p}"
            ));
        }
    }
}

fn validate_fmea_rating(name: &str, rating: Option<u8>, errors: &mut Vec<String>) {
    if let Some(r) = rating {
        if !(FMEA_MIN..=FMEA_MAX).contains(&r) {
            errors.push(format!(
                "{name} must be between {FMEA_MIN} and {FMEA_MAX}, got {r}"
            ));
        }
    }
}

fn validate_fields(fields: &WorkItemFields, errors: &mut Vec<String>) {
    validate_fmea_rating("severity", fields.severity, errors);
    validate_fmea_rating("occurrence", fields.occurrence, errors);
    validate_fmea_rating("detection", fields.detection, errors);
}

fn validate_partial_fields(fields: &PartialFields, errors: &mut Vec<String>) {
    validate_fmea_rating("severity", fields.severity, errors);
    validate_fmea_rating("occurrence", fields.occurrence, errors);
    validate_fmea_rating("detection", fields.detection, errors);
}

pub fn validate_create(payload: &CreateWorkItem) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    validate_title(&payload.title, &mut errors);
    validate_priority(payload.priority, &mut errors);
    validate_fields(&payload.fields, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn validate_update(payload: &UpdateWorkItem) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    if let Some(title) = &payload.title {
        validate_title(title, &mut errors);
    }
    validate_priority(payload.priority, &mut errors);
    if payload.change_description.trim().is_empty() {
        errors.push("change_description must not be blank".into());
    }
    validate_partial_fields(&payload.fields, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
