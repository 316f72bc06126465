use colored::*;
use percebe_core::catalog::{MethodSchema, ServiceCatalog};
use percebe_core::schema::SchemaNode;
use percebe_core::template;
use percebe_core::validate::{Diagnostic, Severity};

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct CatalogSummary<'a>(pub &'a ServiceCatalog);

pub struct MethodSummary<'a>(pub &'a MethodSchema);

pub struct DiagnosticList<'a>(pub &'a [Diagnostic]);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<anyhow::Error> for FormattedString {
    fn from(err: anyhow::Error) -> Self {
        FormattedString(format!("{}\n\n'{err:#}'", "Error:".red().bold()))
    }
}

impl From<CatalogSummary<'_>> for FormattedString {
    fn from(CatalogSummary(catalog): CatalogSummary<'_>) -> Self {
        if catalog.is_empty() {
            return FormattedString("No services found.".yellow().to_string());
        }

        let mut out = String::new();
        out.push_str("Available Services:\n");
        for service in catalog.services() {
            out.push_str(&format!("{}\n", service.green()));
            for method in catalog.methods().filter(|m| m.service == service) {
                out.push_str(&format!("  {}\n", method_signature(method)));
            }
        }
        FormattedString(out.trim_end().to_string())
    }
}

impl From<MethodSummary<'_>> for FormattedString {
    fn from(MethodSummary(method): MethodSummary<'_>) -> Self {
        let mut out = String::new();
        out.push_str(&format!("{}\n\n", method_signature(method)));
        out.push_str(&format!("{}\n", "Request:".cyan()));
        out.push_str(&template::render(&method.request));
        out.push_str(&format!("\n{}\n", "Response:".cyan()));
        out.push_str(&template::render(&method.response));
        FormattedString(out.trim_end().to_string())
    }
}

impl From<DiagnosticList<'_>> for FormattedString {
    fn from(DiagnosticList(diagnostics): DiagnosticList<'_>) -> Self {
        if diagnostics.is_empty() {
            return FormattedString("No issues found.".green().to_string());
        }

        let mut out = String::new();
        for diagnostic in diagnostics {
            let label = match diagnostic.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
            };
            out.push_str(&format!(
                "{}[{}..{}]: {}\n",
                label, diagnostic.range.start, diagnostic.range.end, diagnostic.message
            ));
        }
        FormattedString(out.trim_end().to_string())
    }
}

fn method_signature(method: &MethodSchema) -> String {
    let input_stream = if method.client_streaming {
        format!("{} ", "stream".cyan())
    } else {
        "".to_string()
    };
    let output_stream = if method.server_streaming {
        format!("{} ", "stream".cyan())
    } else {
        "".to_string()
    };

    format!(
        "{} {}({}{}) {} ({}{});",
        "rpc".cyan(),
        method.method.green(),
        input_stream,
        node_name(&method.request).yellow(),
        "returns".cyan(),
        output_stream,
        node_name(&method.response).yellow()
    )
}

fn node_name(node: &SchemaNode) -> &str {
    match node {
        SchemaNode::Message(message) => &message.name,
        other => other.kind_name(),
    }
}
