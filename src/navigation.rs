//! View routing for clients: a tagged view type, the role-gated menu and a
//! history stack. Holds no clinical logic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::authorization::{is_allowed, Permission};
use crate::models::{DocumentKind, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum View {
    Programacion,
    Pacientes,
    Usuarios,
    #[serde(rename_all = "camelCase")]
    ProcedimientoDetail { procedure_id: i64 },
    /// Form for one clinical document.
    #[serde(rename_all = "camelCase")]
    Documento { procedure_id: i64, kind: DocumentKind },
    /// Printable surgical consent, reached only after its form saved.
    #[serde(rename_all = "camelCase")]
    ConsentimientoImpreso { procedure_id: i64 },
    #[serde(rename_all = "camelCase")]
    AgregarFoto { procedure_id: i64 },
}

impl View {
    /// Permission needed to open this view.
    fn permission(&self) -> Permission {
        match self {
            View::Usuarios => Permission::ManageUsers,
            View::Pacientes => Permission::ViewPatients,
            View::AgregarFoto { .. } => Permission::AttachPhotos,
            View::Programacion
            | View::ProcedimientoDetail { .. }
            | View::Documento { .. }
            | View::ConsentimientoImpreso { .. } => Permission::ClinicalRecords,
        }
    }

    /// Where "back" leads from here, if anywhere.
    fn parent(&self) -> Option<View> {
        match *self {
            View::Documento { procedure_id, .. }
            | View::ConsentimientoImpreso { procedure_id }
            | View::AgregarFoto { procedure_id } => Some(View::ProcedimientoDetail { procedure_id }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    #[serde(flatten)]
    pub view: View,
    pub label: &'static str,
}

/// Top-level menu for a role.
pub fn menu_for(role: Role) -> Vec<MenuEntry> {
    let pacientes_label = if role == Role::Medico { "Mis Pacientes" } else { "Pacientes" };
    [
        (View::Programacion, "Programación"),
        (View::Pacientes, pacientes_label),
        (View::Usuarios, "Usuarios"),
    ]
    .into_iter()
    .filter(|(view, _)| is_allowed(role, view.permission()))
    .map(|(view, label)| MenuEntry { view, label })
    .collect()
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("view {0:?} is not available to role {1}")]
    NotPermitted(View, Role),
    #[error("the consent must be saved before it can be printed")]
    ConsentNotSaved,
}

/// History stack for one signed-in user. The bottom entry is the role's
/// home view and is never popped.
#[derive(Debug, Clone)]
pub struct Navigator {
    role: Role,
    history: Vec<View>,
}

impl Navigator {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            history: vec![View::Programacion],
        }
    }

    pub fn current(&self) -> View {
        // history is never empty
        self.history.last().copied().unwrap_or(View::Programacion)
    }

    pub fn navigate(&mut self, view: View) -> Result<View, NavigationError> {
        if !is_allowed(self.role, view.permission()) {
            return Err(NavigationError::NotPermitted(view, self.role));
        }
        if matches!(view, View::ConsentimientoImpreso { .. }) {
            return Err(NavigationError::ConsentNotSaved);
        }
        self.history.push(view);
        Ok(view)
    }

    /// Advance from a document form after a save attempt. A saved surgical
    /// consent moves on to its printable step; other forms stay put.
    pub fn document_saved(&mut self, saved: bool) -> View {
        let current = self.current();
        if let View::Documento {
            procedure_id,
            kind: DocumentKind::ConsentimientoQuirurgico,
        } = current
        {
            if saved {
                let next = View::ConsentimientoImpreso { procedure_id };
                self.history.push(next);
                return next;
            }
        }
        current
    }

    /// Go back. Document and photo views return to their procedure detail
    /// even when reached directly.
    pub fn back(&mut self) -> View {
        let current = self.current();
        if self.history.len() > 1 {
            self.history.pop();
        }
        if let Some(parent) = current.parent() {
            // Skip intermediate steps of the same procedure.
            while self.history.len() > 1 && self.current() != parent {
                self.history.pop();
            }
            if self.current() != parent {
                self.history.push(parent);
            }
        }
        self.current()
    }

    pub fn reset(&mut self) -> View {
        self.history.truncate(1);
        self.current()
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }
}
