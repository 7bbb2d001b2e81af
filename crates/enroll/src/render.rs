//! Plain-text rendering of form snapshots for the terminal.

use std::fmt::Write;

use turmas_core::controller::{FormSnapshot, FormView, NoticeKind};
use turmas_core::lookup::NameCheck;
use turmas_core::types::{ClassCode, Relationship};
use turmas_core::validation::FormField;

/// Label shown next to a field, as on the enrollment form.
pub fn field_label(field: FormField) -> &'static str {
    match field {
        FormField::ChildName => "Nome da Criança",
        FormField::GuardianPhone => "Telefone do Responsável",
        FormField::TransportNote => "Transporte Escolar",
        FormField::ClassCode => "Turma da Criança",
    }
}

/// Render the outcome-relevant parts of a snapshot: the alert, then one
/// line per field error.
pub fn describe(snapshot: &FormSnapshot) -> String {
    let mut out = String::new();

    if let Some(notice) = &snapshot.notice {
        let tag = match notice.kind {
            NoticeKind::Success => "OK",
            NoticeKind::Error => "ERRO",
        };
        let _ = writeln!(out, "[{tag}] {}", notice.message);
    }

    for (field, message) in snapshot.errors.iter() {
        let _ = writeln!(out, "  {}: {message}", field_label(field));
    }

    if snapshot.view == FormView::Submitted {
        let _ = writeln!(out, "Formulário Enviado Com Sucesso, Obrigado!");
    }
    out
}

/// One-line summary of a name check.
pub fn describe_name_check(check: &NameCheck) -> String {
    match check {
        NameCheck::Unchecked => "Nome não verificado".to_string(),
        NameCheck::Pending { name } => format!("Verificando \"{name}\"..."),
        NameCheck::Available { name } => format!("\"{name}\" ainda não está cadastrado"),
        NameCheck::Taken { name } => format!("\"{name}\" já está cadastrado"),
        NameCheck::Failed { name, reason } => {
            format!("Não foi possível verificar \"{name}\": {reason}")
        }
    }
}

/// Table of class codes for the `classes` subcommand.
pub fn class_table() -> String {
    let mut out = String::new();
    for code in ClassCode::ALL {
        let marker = if code.allows_leaving_alone() {
            "  (pode ir sozinho)"
        } else {
            ""
        };
        let _ = writeln!(out, "{:<10}{}{marker}", code.as_str(), code.label());
    }
    out
}

/// Table of relationship codes accepted in `grauParentesco`.
pub fn relationship_table() -> String {
    let mut out = String::new();
    for rel in Relationship::OPTIONS {
        let _ = writeln!(out, "{:<20}{}", rel.as_str(), rel.label());
    }
    out
}
