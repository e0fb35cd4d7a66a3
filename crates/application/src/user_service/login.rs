use super::*;

impl UserService {
    /// Authenticates a user with email and password.
    ///
    /// Unknown emails still hash the password so response timing does not
    /// reveal which accounts exist.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        request: &RequestMetadata,
    ) -> AppResult<AuthOutcome> {
        let Ok(email) = EmailAddress::new(email) else {
            let _ = self.password_hasher.hash_password(password);
            return Ok(AuthOutcome::Failed);
        };

        let Some(user) = self.user_repository.find_by_email(email.as_str()).await? else {
            let _ = self.password_hasher.hash_password(password);
            return Ok(AuthOutcome::Failed);
        };

        if user.failed_login_count >= self.policy.max_login_attempts {
            let _ = self.password_hasher.hash_password(password);
            return Ok(AuthOutcome::Locked);
        }

        if !self
            .password_hasher
            .verify_password(password, &user.password_hash)?
        {
            let max_attempts = self.policy.max_login_attempts;
            let lock_audit = self.audit_logger.draft(
                &user_target(user.user_id),
                AuditAction::Updated,
                &format!("account locked after {max_attempts} failed sign-ins"),
                None,
                &user.identity(),
                request,
            );
            let failures = self
                .user_repository
                .record_failed_login(user.user_id, max_attempts, &lock_audit)
                .await?;
            return Ok(if failures < max_attempts {
                AuthOutcome::Failed
            } else {
                AuthOutcome::Locked
            });
        }

        if !user.is_active {
            return Ok(AuthOutcome::Failed);
        }

        if user.failed_login_count > 0 {
            self.user_repository
                .reset_failed_logins(user.user_id, &[])
                .await?;
        }

        Ok(AuthOutcome::Authenticated(user.identity()))
    }

    /// Creates the first curator of an empty registry.
    pub async fn bootstrap(
        &self,
        request: &RequestMetadata,
        input: NewUserInput,
    ) -> AppResult<UserIdentity> {
        if self.user_repository.count_users().await? > 0 {
            return Err(AppError::Conflict(
                "the registry already has user accounts".to_owned(),
            ));
        }

        let record = self.build_record(NewUserInput {
            role: UserRole::Curator,
            ..input
        })?;
        let identity = record.identity();

        let audit = self.audit_logger.draft(
            &user_target(record.user_id),
            AuditAction::Created,
            &format!("initial curator account {} created", record.email),
            None,
            &identity,
            request,
        );
        self.user_repository.create_user(&record, &audit).await?;

        Ok(identity)
    }
}
