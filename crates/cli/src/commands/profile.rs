//! Profile commands.

use askama::Template;

use shopkeep_client::AppContext;
use shopkeep_client::views::{ProfileField, ProfileView};

use super::{CliError, emit};
use crate::render::ProfileTemplate;

/// Profile fields given on the command line.
#[derive(Debug, Default)]
pub struct ProfileEdits {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
}

fn render(view: &ProfileView) -> Result<(), CliError> {
    emit(&ProfileTemplate::from_view(view).render()?)
}

/// Show the signed-in user's profile.
pub async fn show(ctx: &AppContext) -> Result<(), CliError> {
    let view = ProfileView::open(ctx.clone()).await?;
    render(&view)
}

/// Change the given profile fields and save.
pub async fn edit(ctx: &AppContext, edits: ProfileEdits) -> Result<(), CliError> {
    let mut view = ProfileView::open(ctx.clone()).await?;
    if let Some(message) = view.notice() {
        return Err(CliError::Failed(message.to_owned()));
    }

    let ProfileEdits {
        username,
        email,
        bio,
    } = edits;
    for (field, value) in [
        (ProfileField::Username, username),
        (ProfileField::Email, email),
        (ProfileField::Bio, bio),
    ] {
        if let Some(value) = value {
            view.toggle_edit(field);
            view.set(field, value);
        }
    }

    if !view.is_dirty() {
        emit("Nothing to change.")?;
        return render(&view);
    }

    view.save().await?;
    render(&view)
}
