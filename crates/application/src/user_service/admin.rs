use super::*;

impl UserService {
    /// Creates an account.
    pub async fn create_user(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        input: NewUserInput,
    ) -> AppResult<UserRecord> {
        self.require_manage(actor).await?;

        let record = self.build_record(input)?;
        let audit = self.audit_logger.draft(
            &user_target(record.user_id),
            AuditAction::Created,
            &format!(
                "account {} created with role {}",
                record.email,
                record.role.as_str()
            ),
            None,
            actor,
            request,
        );
        self.user_repository.create_user(&record, &audit).await?;

        Ok(record)
    }

    /// Lists every account.
    pub async fn list_users(&self, actor: &UserIdentity) -> AppResult<Vec<UserRecord>> {
        self.require_manage(actor).await?;
        self.user_repository.list_users().await
    }

    /// Changes the role of an account.
    ///
    /// The last active curator cannot be demoted.
    pub async fn change_role(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        user_id: UserId,
        role: UserRole,
    ) -> AppResult<UserRecord> {
        self.require_manage(actor).await?;
        let before = self.require_user(user_id).await?;
        if before.role == role {
            return Ok(before);
        }
        self.ensure_not_last_curator(&before).await?;

        let after = UserRecord {
            role,
            ..before.clone()
        };
        let changes = [FieldChange::new(
            "role",
            before.role.as_str(),
            after.role.as_str(),
        )];
        let audit = self.audit_logger.draft(
            &user_target(user_id),
            AuditAction::Updated,
            &format!("role of {} changed", after.email),
            Some(&changes),
            actor,
            request,
        );
        self.user_repository.update_user(&after, &audit).await?;

        Ok(after)
    }

    /// Activates or deactivates an account.
    ///
    /// The last active curator cannot be deactivated.
    pub async fn set_user_active(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        user_id: UserId,
        is_active: bool,
    ) -> AppResult<UserRecord> {
        self.require_manage(actor).await?;
        let before = self.require_user(user_id).await?;
        if before.is_active == is_active {
            return Ok(before);
        }
        if !is_active {
            self.ensure_not_last_curator(&before).await?;
        }

        let after = UserRecord {
            is_active,
            ..before.clone()
        };
        let changes = [FieldChange::new(
            "is_active",
            render_flag(before.is_active),
            render_flag(after.is_active),
        )];
        let verb = if is_active { "activated" } else { "deactivated" };
        let audit = self.audit_logger.draft(
            &user_target(user_id),
            AuditAction::Updated,
            &format!("account {} {verb}", after.email),
            Some(&changes),
            actor,
            request,
        );
        self.user_repository.update_user(&after, &audit).await?;

        Ok(after)
    }

    /// Clears the failed sign-in counter of a locked account.
    pub async fn unlock_user(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        user_id: UserId,
    ) -> AppResult<()> {
        self.require_manage(actor).await?;
        let user = self.require_user(user_id).await?;
        if user.failed_login_count == 0 {
            return Ok(());
        }

        let audit = self.audit_logger.draft(
            &user_target(user_id),
            AuditAction::Updated,
            &format!("account {} unlocked", user.email),
            Some(&[FieldChange::new(
                "failed_login_count",
                user.failed_login_count.to_string(),
                "0",
            )]),
            actor,
            request,
        );
        self.user_repository
            .reset_failed_logins(user_id, &audit)
            .await
    }

    /// Counts the records a user created. Users may read their own activity.
    pub async fn user_activity(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
    ) -> AppResult<UserActivity> {
        let subject = user_id.to_string();
        if actor.subject() != subject {
            self.require_manage(actor).await?;
        }
        self.require_user(user_id).await?;

        let contributions = self
            .specimen_repository
            .count_contributions(&subject)
            .await?;
        let images_uploaded = self.image_repository.count_uploaded_by(&subject).await?;

        Ok(UserActivity {
            specimens_created: contributions.specimens_created,
            sites_added: contributions.sites_added,
            images_uploaded,
        })
    }

    async fn require_manage(&self, actor: &UserIdentity) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, Permission::UserManage)
            .await
    }

    async fn ensure_not_last_curator(&self, user: &UserRecord) -> AppResult<()> {
        if user.role != UserRole::Curator || !user.is_active {
            return Ok(());
        }

        if self
            .user_repository
            .count_active_with_role(UserRole::Curator)
            .await?
            <= 1
        {
            return Err(AppError::Validation(
                "at least one active curator must remain".to_owned(),
            ));
        }

        Ok(())
    }
}
