//! Profile screen.
//!
//! Edits go into a local draft, one field at a time behind an edit toggle,
//! and reach the backend only on [`ProfileView::save`].

use std::collections::BTreeSet;

use tracing::{debug, info, instrument};

use shopkeep_core::{Email, Username};

use crate::api::{ApiError, ProfileUpdate, UserProfile};
use crate::error::{Field, FieldErrors, ViewError};
use crate::query::Mutation;
use crate::routing::Route;
use crate::state::AppContext;

use super::REQUEST_FAILED;

/// Shown in place of an empty bio.
pub const EMPTY_BIO: &str = "Add Something Here";

/// A user-editable profile field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileField {
    Username,
    Email,
    Bio,
}

impl ProfileField {
    const fn field(self) -> Field {
        match self {
            Self::Username => Field::Username,
            Self::Email => Field::Email,
            Self::Bio => Field::Bio,
        }
    }
}

/// Staged profile edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    pub username: String,
    pub email: String,
    pub bio: String,
}

impl ProfileDraft {
    fn of(profile: &UserProfile) -> Self {
        Self {
            username: profile.username.clone(),
            email: profile.email.clone(),
            bio: profile.bio.clone().unwrap_or_default(),
        }
    }

    const fn slot(&mut self, field: ProfileField) -> &mut String {
        match field {
            ProfileField::Username => &mut self.username,
            ProfileField::Email => &mut self.email,
            ProfileField::Bio => &mut self.bio,
        }
    }

    fn validate(&self) -> Result<ProfileUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();
        let username = errors.check(ProfileField::Username.field(), Username::parse(&self.username));
        let email = errors.check(ProfileField::Email.field(), Email::parse(&self.email));
        match (username, email) {
            (Some(username), Some(email)) => Ok(ProfileUpdate {
                username,
                email,
                bio: self.bio.trim().to_owned(),
            }),
            _ => Err(errors),
        }
    }
}

/// The profile screen.
#[derive(Debug)]
pub struct ProfileView {
    ctx: AppContext,
    profile: Option<UserProfile>,
    draft: ProfileDraft,
    editing: BTreeSet<ProfileField>,
    field_errors: FieldErrors,
    notice: Option<String>,
}

impl ProfileView {
    /// Enter the profile screen and load the profile.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Redirected` without a session or when the session
    /// is rejected. Other load failures are left in [`ProfileView::notice`].
    pub async fn open(ctx: AppContext) -> Result<Self, ViewError> {
        ctx.enter(Route::Profile)?;
        let mut view = Self {
            ctx,
            profile: None,
            draft: ProfileDraft::default(),
            editing: BTreeSet::new(),
            field_errors: FieldErrors::new(),
            notice: None,
        };
        match view.load().await {
            Err(ViewError::Redirected(route)) => Err(ViewError::Redirected(route)),
            _ => Ok(view),
        }
    }

    /// Fetch the profile and reset the draft to it.
    ///
    /// # Errors
    ///
    /// Returns the settled error when the profile cannot be read.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<(), ViewError> {
        match self.ctx.queries().profile().await {
            Ok(profile) => {
                self.draft = ProfileDraft::of(&profile);
                self.profile = Some(profile);
                self.editing.clear();
                Ok(())
            }
            Err(e) => Err(self.fail(&e)),
        }
    }

    /// The profile as last loaded.
    #[must_use]
    pub const fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub const fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    #[must_use]
    pub const fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    #[must_use]
    pub fn is_editing(&self, field: ProfileField) -> bool {
        self.editing.contains(&field)
    }

    /// Flip a field's edit toggle. Returns whether it is now editable.
    pub fn toggle_edit(&mut self, field: ProfileField) -> bool {
        if self.editing.remove(&field) {
            false
        } else {
            self.editing.insert(field);
            true
        }
    }

    /// Stage a new value. Ignored unless the field is being edited.
    pub fn set(&mut self, field: ProfileField, value: impl Into<String>) -> bool {
        if !self.is_editing(field) {
            debug!(?field, "Ignoring edit to locked field");
            return false;
        }
        *self.draft.slot(field) = value.into();
        true
    }

    /// Whether the draft differs from the loaded profile.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|p| ProfileDraft::of(p) != self.draft)
    }

    /// Creation date as `YYYY-MM-DD`.
    #[must_use]
    pub fn created_at_display(&self) -> Option<String> {
        self.profile
            .as_ref()?
            .created_at
            .map(|at| at.format("%Y-%m-%d").to_string())
    }

    /// The bio, or [`EMPTY_BIO`] when there is none.
    #[must_use]
    pub fn bio_display(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|p| p.bio.as_deref())
            .map(str::trim)
            .filter(|bio| !bio.is_empty())
            .unwrap_or(EMPTY_BIO)
    }

    /// Drop staged edits.
    pub fn discard(&mut self) {
        if let Some(profile) = &self.profile {
            self.draft = ProfileDraft::of(profile);
        }
        self.editing.clear();
        self.field_errors = FieldErrors::new();
    }

    /// Send the draft's user-editable fields, then reload the profile.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Invalid` for an empty username or malformed email
    /// (no request is sent), `ViewError::Redirected` without a session, or
    /// `ViewError::Failed`. The draft is kept on failure.
    #[instrument(skip(self))]
    pub async fn save(&mut self) -> Result<(), ViewError> {
        self.notice = None;
        let update = match self.draft.validate() {
            Ok(update) => update,
            Err(errors) => {
                self.field_errors = errors.clone();
                return Err(ViewError::Invalid(errors));
            }
        };
        self.field_errors = FieldErrors::new();

        let api = self.ctx.api().clone();
        let queries = self.ctx.queries().clone();
        if let Err(e) = queries
            .mutate(Mutation::UpdateProfile, api.update_profile(&update))
            .await
        {
            return Err(self.fail(&e));
        }
        info!("Profile saved");
        self.load().await
    }

    fn fail(&mut self, err: &ApiError) -> ViewError {
        let outcome = self.ctx.settle(err, REQUEST_FAILED);
        if let ViewError::Failed(message) = &outcome {
            self.notice = Some(message.clone());
        }
        outcome
    }
}
