//! Template rendering
//!
//! For sub-section roles, a section is kept only when every variable it
//! references is present and non-empty in the context. Kept sections are
//! joined with one blank line. A plain string role is always rendered;
//! placeholders with no value in the context are left as written.

use serde::Serialize;

use super::parse::Segment;
use super::{PromptTemplate, Role, RoleTemplate, Section};
use crate::context::{RenderContext, value_text};

/// The rendered text for each role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

impl RenderedPrompt {
    pub fn role(&self, role: Role) -> &str {
        match role {
            Role::System => &self.system,
            Role::User => &self.user,
        }
    }
}

/// Render both roles of `template` against `context`
pub fn render(template: &PromptTemplate, context: &RenderContext) -> RenderedPrompt {
    RenderedPrompt {
        system: template
            .system
            .as_ref()
            .map(|rt| render_role(rt, context))
            .unwrap_or_default(),
        user: template
            .user
            .as_ref()
            .map(|rt| render_role(rt, context))
            .unwrap_or_default(),
    }
}

fn render_role(role: &RoleTemplate, context: &RenderContext) -> String {
    match role {
        RoleTemplate::Text(section) => substitute(section, context),
        RoleTemplate::Sections(sections) => {
            let kept: Vec<String> = sections
                .iter()
                .filter(|section| {
                    let keep = is_satisfied(section, context);
                    if !keep {
                        log::debug!(
                            "Omitting sub-section '{}': missing or empty variables",
                            section.name.as_deref().unwrap_or_default()
                        );
                    }
                    keep
                })
                .map(|section| substitute(section, context))
                .filter(|text| !text.is_empty())
                .collect();
            kept.join("\n\n")
        }
    }
}

/// Every required variable present with a non-empty value
pub fn is_satisfied(section: &Section, context: &RenderContext) -> bool {
    section.required().iter().all(|name| context.has_value(name))
}

fn substitute(section: &Section, context: &RenderContext) -> String {
    let mut out = String::with_capacity(section.source.len());
    for segment in &section.segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Escaped(inner) => {
                out.push('{');
                out.push_str(inner);
                out.push('}');
            }
            Segment::Var(name) => match context.get(name) {
                Some(value) => out.push_str(&value_text(value)),
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            },
        }
    }
    out.trim_end_matches(['\n', '\r']).to_string()
}
