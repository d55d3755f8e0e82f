//! Rendered prompt validation

use crate::error::{Error, Result};
use crate::template::Role;
use crate::template::render::RenderedPrompt;

/// Fail on the first role whose rendered text is empty, `system` first
pub fn validate(rendered: &RenderedPrompt) -> Result<()> {
    for role in Role::ALL {
        if rendered.role(role).is_empty() {
            return Err(Error::Validation {
                role: role.as_str().to_string(),
            });
        }
    }
    Ok(())
}
