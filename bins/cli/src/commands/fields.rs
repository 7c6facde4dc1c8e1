//! Fields command handler.

use crate::console::{ConsoleArgs, block_on, drain_toasts, load_section, open_editor};
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, format_ndjson_summary, log_info, to_pretty_json_line};
use config_console_domain::{FieldDescriptor, SectionForm, section_label};
use config_console_shared::{ErrorCode, ErrorEnvelope, RequestContext};
use serde_json::{Value, json};

/// Run the fields command.
pub fn run_fields(
    mode: OutputMode,
    console: ConsoleArgs<'_>,
    section: &str,
) -> Result<CliOutput, CliError> {
    let mut editor = match open_editor(console, mode) {
        Ok(editor) => editor,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let ctx = RequestContext::new_operation();
    if let Err(error) = block_on(load_section(&mut editor, &ctx, section))? {
        return Ok(format_error_output(mode, &error));
    }
    let Some(form) = editor.session().form().cloned() else {
        let error = ErrorEnvelope::invariant(ErrorCode::internal(), "active section has no form");
        return Ok(format_error_output(mode, &error));
    };

    let mut stderr = String::new();
    drain_toasts(&mut editor, &mut stderr, mode.no_progress);
    log_info(&mut stderr, "fields described", mode.no_progress);

    let fields: Vec<Value> = form.fields().iter().map(field_json).collect();
    let section_error = form.section_error().map(ToString::to_string);

    let stdout = if mode.is_ndjson() {
        let mut out = String::new();
        for field in &fields {
            let mut payload = json!({ "type": "field", "section": form.section().as_str() });
            if let (Value::Object(target), Value::Object(source)) = (&mut payload, field) {
                target.extend(source.clone());
            }
            let mut line = serde_json::to_string(&payload)?;
            line.push('\n');
            out.push_str(&line);
        }
        out.push_str(&format_ndjson_summary(
            "ok",
            "fields",
            Some(json!({
                "section": form.section().as_str(),
                "count": fields.len(),
                "sectionError": section_error,
            })),
        ));
        out
    } else if mode.is_json() {
        to_pretty_json_line(&json!({
            "status": "ok",
            "section": form.section().as_str(),
            "label": section_label(form.section().as_str()),
            "sectionError": section_error,
            "fields": fields,
        }))?
    } else {
        format_fields_text(&form)
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn field_json(field: &FieldDescriptor) -> Value {
    json!({
        "key": field.path.key,
        "label": field.label,
        "type": field.schema_type().map(|kind| kind.as_str()),
        "hint": field.hint.as_str(),
        "secret": field.is_secret,
        "value": field.value,
        "help": field.help,
        "placeholder": field.placeholder,
        "error": field.resolution_error.as_ref().map(ToString::to_string),
    })
}

fn format_fields_text(form: &SectionForm) -> String {
    let name = form.section().as_str();
    let mut out = format!("status: ok\nsection: {name} ({})\n", section_label(name));
    if let Some(error) = form.section_error() {
        out.push_str("error: ");
        out.push_str(&error.to_string());
        out.push('\n');
        return out;
    }

    out.push_str("fields:\n");
    for field in form.fields() {
        out.push_str("  ");
        out.push_str(&field.path.key);
        out.push_str(" [");
        out.push_str(field.hint.as_str());
        out.push_str("] ");
        out.push_str(&field.label);
        out.push('\n');
        if field.is_degraded() {
            if let Some(error) = field.resolution_error.as_ref() {
                out.push_str("    error: ");
                out.push_str(&error.to_string());
                out.push('\n');
            }
            continue;
        }
        out.push_str("    value: ");
        out.push_str(&field.value.to_string());
        out.push('\n');
        if let Some(help) = field.help.as_deref() {
            out.push_str("    help: ");
            out.push_str(help);
            out.push('\n');
        }
        if let Some(placeholder) = field.placeholder.as_deref() {
            out.push_str("    placeholder: ");
            out.push_str(placeholder);
            out.push('\n');
        }
    }
    out
}
