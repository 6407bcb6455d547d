//! Database service for invoicing-core.

use crate::engine::numbering::{format_invoice_number, needs_reset};
use crate::engine::validation::format_hsn_sac_code;
use crate::error::AppError;
use crate::models::{
    CreateHsnCode, CreateTaxProfile, HsnCode, InvoiceSettings, ResetFrequency, TaxProfile,
    UpdateInvoiceSettings, UpdateTaxProfile,
};
use crate::services::metrics::{DB_QUERY_DURATION, ERRORS_TOTAL, INVOICE_NUMBERS_TOTAL};
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const SETTINGS_COLUMNS: &str = "branch_id, number_prefix, number_suffix, next_number, number_digits, \
     reset_frequency, last_reset_date, default_tax_enabled, default_tax_type, default_tax_rate, \
     default_gst_treatment, default_place_of_supply, default_terms, default_notes, \
     company_name, company_address, company_gst_number, created_utc";

const TAX_PROFILE_COLUMNS: &str = "tax_profile_id::text AS id, name, description, tax_type, tax_rate, \
     hsn_code, is_default, applies_to, is_active, created_utc";

/// Wrap a storage failure, counting it for alerting.
fn db_error(context: &str, e: impl std::fmt::Display) -> AppError {
    ERRORS_TOTAL.with_label_values(&["db_error"]).inc();
    AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, e))
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "invoicing-core"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| db_error("Failed to connect", e))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Health check failed", e))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| db_error("Migration failed", e))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Invoice Settings Operations
    // -------------------------------------------------------------------------

    /// Get the invoice settings for a branch.
    #[instrument(skip(self), fields(branch_id = %branch_id))]
    pub async fn get_invoice_settings(
        &self,
        branch_id: Uuid,
    ) -> Result<Option<InvoiceSettings>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice_settings"])
            .start_timer();

        let settings = sqlx::query_as::<_, InvoiceSettings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM invoice_settings WHERE branch_id = $1"
        ))
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get invoice settings", e))?;

        timer.observe_duration();

        Ok(settings)
    }

    /// Create default invoice settings for a branch that has none yet.
    #[instrument(skip(self), fields(branch_id = %branch_id))]
    pub async fn create_default_invoice_settings(
        &self,
        branch_id: Uuid,
    ) -> Result<InvoiceSettings, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_default_invoice_settings"])
            .start_timer();

        let defaults = InvoiceSettings::defaults(branch_id, Utc::now());
        let settings = sqlx::query_as::<_, InvoiceSettings>(&format!(
            r#"
            INSERT INTO invoice_settings (
                branch_id, number_prefix, number_suffix, next_number, number_digits,
                reset_frequency, last_reset_date, default_tax_enabled, default_tax_type,
                default_tax_rate, default_gst_treatment
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (branch_id) DO NOTHING
            RETURNING {SETTINGS_COLUMNS}
            "#
        ))
        .bind(defaults.branch_id)
        .bind(&defaults.number_prefix)
        .bind(&defaults.number_suffix)
        .bind(defaults.next_number)
        .bind(defaults.number_digits)
        .bind(&defaults.reset_frequency)
        .bind(defaults.last_reset_date)
        .bind(defaults.default_tax_enabled)
        .bind(&defaults.default_tax_type)
        .bind(defaults.default_tax_rate)
        .bind(&defaults.default_gst_treatment)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create default invoice settings", e))?;

        timer.observe_duration();

        match settings {
            Some(settings) => {
                info!(branch_id = %branch_id, "Default invoice settings created");
                Ok(settings)
            }
            // Another caller inserted the row first; read theirs.
            None => self.get_invoice_settings(branch_id).await?.ok_or_else(|| {
                db_error(
                    "Failed to create default invoice settings",
                    "row vanished after concurrent insert",
                )
            }),
        }
    }

    /// Get invoice settings, lazily creating the defaults on first access.
    pub async fn get_or_create_invoice_settings(
        &self,
        branch_id: Uuid,
    ) -> Result<InvoiceSettings, AppError> {
        match self.get_invoice_settings(branch_id).await? {
            Some(settings) => Ok(settings),
            None => self.create_default_invoice_settings(branch_id).await,
        }
    }

    /// Partially update invoice settings for a branch.
    #[instrument(skip(self, input), fields(branch_id = %branch_id))]
    pub async fn update_invoice_settings(
        &self,
        branch_id: Uuid,
        input: &UpdateInvoiceSettings,
    ) -> Result<Option<InvoiceSettings>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice_settings"])
            .start_timer();

        let reset_frequency = input.reset_frequency.map(|f| f.as_str().to_string());
        let settings = sqlx::query_as::<_, InvoiceSettings>(&format!(
            r#"
            UPDATE invoice_settings
            SET number_prefix = COALESCE($2, number_prefix),
                number_suffix = COALESCE($3, number_suffix),
                number_digits = COALESCE($4, number_digits),
                reset_frequency = COALESCE($5, reset_frequency),
                default_tax_enabled = COALESCE($6, default_tax_enabled),
                default_tax_type = COALESCE($7, default_tax_type),
                default_tax_rate = COALESCE($8, default_tax_rate),
                default_gst_treatment = COALESCE($9, default_gst_treatment),
                default_place_of_supply = COALESCE($10, default_place_of_supply),
                default_terms = COALESCE($11, default_terms),
                default_notes = COALESCE($12, default_notes),
                company_name = COALESCE($13, company_name),
                company_address = COALESCE($14, company_address),
                company_gst_number = COALESCE($15, company_gst_number)
            WHERE branch_id = $1
            RETURNING {SETTINGS_COLUMNS}
            "#
        ))
        .bind(branch_id)
        .bind(&input.number_prefix)
        .bind(&input.number_suffix)
        .bind(input.number_digits)
        .bind(reset_frequency)
        .bind(input.default_tax_enabled)
        .bind(&input.default_tax_type)
        .bind(input.default_tax_rate)
        .bind(&input.default_gst_treatment)
        .bind(&input.default_place_of_supply)
        .bind(&input.default_terms)
        .bind(&input.default_notes)
        .bind(&input.company_name)
        .bind(&input.company_address)
        .bind(&input.company_gst_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update invoice settings", e))?;

        timer.observe_duration();

        if settings.is_some() {
            info!(branch_id = %branch_id, "Invoice settings updated");
        }

        Ok(settings)
    }

    /// Allocate and format the next invoice number for a branch.
    ///
    /// The counter advance is atomic (`UPDATE ... next_number = next_number +
    /// 1 ... RETURNING`) and awaited before the number is handed back, so two
    /// concurrent callers can never receive the same number. A periodic reset
    /// is a compare-and-swap on `last_reset_date`; the loser of that race
    /// falls back to the plain increment.
    #[instrument(skip(self), fields(branch_id = %branch_id))]
    pub async fn generate_invoice_number(&self, branch_id: Uuid) -> Result<String, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["generate_invoice_number"])
            .start_timer();

        let settings = self.get_or_create_invoice_settings(branch_id).await?;
        let now = Utc::now();
        let frequency = ResetFrequency::from_string(&settings.reset_frequency);

        let (allocated, did_reset) = if needs_reset(frequency, settings.last_reset_date, now) {
            let reset = sqlx::query(
                r#"
                UPDATE invoice_settings
                SET next_number = 2, last_reset_date = $3
                WHERE branch_id = $1 AND last_reset_date = $2
                "#,
            )
            .bind(branch_id)
            .bind(settings.last_reset_date)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to reset invoice counter", e))?;

            if reset.rows_affected() > 0 {
                (1, true)
            } else {
                (self.advance_counter(branch_id).await?, false)
            }
        } else {
            (self.advance_counter(branch_id).await?, false)
        };

        timer.observe_duration();

        INVOICE_NUMBERS_TOTAL
            .with_label_values(&[if did_reset { "yes" } else { "no" }])
            .inc();

        let number = format_invoice_number(&settings, allocated, now);
        info!(
            branch_id = %branch_id,
            invoice_number = %number,
            reset = did_reset,
            "Invoice number allocated"
        );

        Ok(number)
    }

    /// Atomically advance the counter, returning the value just consumed.
    async fn advance_counter(&self, branch_id: Uuid) -> Result<i64, AppError> {
        let next: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE invoice_settings
            SET next_number = next_number + 1
            WHERE branch_id = $1
            RETURNING next_number
            "#,
        )
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to advance invoice counter", e))?;

        next.map(|n| n - 1).ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!(
                "Invoice settings not found for branch {}",
                branch_id
            ))
        })
    }

    // -------------------------------------------------------------------------
    // HSN Code Operations
    // -------------------------------------------------------------------------

    /// Create a new HSN code. The code is normalized (digits only, padded to
    /// four) before insertion.
    #[instrument(skip(self, input))]
    pub async fn create_hsn_code(&self, input: &CreateHsnCode) -> Result<HsnCode, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_hsn_code"])
            .start_timer();

        let code = format_hsn_sac_code(&input.code);
        let hsn_code_id = Uuid::new_v4();
        let hsn = sqlx::query_as::<_, HsnCode>(
            r#"
            INSERT INTO hsn_codes (hsn_code_id, code, description, gst_rate, is_service, is_active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING hsn_code_id, code, description, gst_rate, is_service, is_active, created_utc
            "#,
        )
        .bind(hsn_code_id)
        .bind(&code)
        .bind(&input.description)
        .bind(input.gst_rate)
        .bind(input.is_service)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("HSN code '{}' already exists", code))
            }
            _ => db_error("Failed to create HSN code", e),
        })?;

        timer.observe_duration();

        info!(hsn_code_id = %hsn.hsn_code_id, code = %hsn.code, "HSN code created");

        Ok(hsn)
    }

    /// List HSN codes.
    #[instrument(skip(self))]
    pub async fn list_hsn_codes(&self, active_only: bool) -> Result<Vec<HsnCode>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_hsn_codes"])
            .start_timer();

        let codes = sqlx::query_as::<_, HsnCode>(
            r#"
            SELECT hsn_code_id, code, description, gst_rate, is_service, is_active, created_utc
            FROM hsn_codes
            WHERE ($1::bool = FALSE OR is_active = TRUE)
            ORDER BY code
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list HSN codes", e))?;

        timer.observe_duration();

        Ok(codes)
    }

    /// Search active HSN codes by code prefix or description substring.
    /// LIKE metacharacters in the query match literally.
    #[instrument(skip(self))]
    pub async fn search_hsn_codes(&self, query: &str) -> Result<Vec<HsnCode>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["search_hsn_codes"])
            .start_timer();

        let pattern = escape_like(query);
        let codes = sqlx::query_as::<_, HsnCode>(
            r#"
            SELECT hsn_code_id, code, description, gst_rate, is_service, is_active, created_utc
            FROM hsn_codes
            WHERE is_active
              AND (code LIKE $1 || '%' OR description ILIKE '%' || $1 || '%')
            ORDER BY code
            LIMIT 50
            "#,
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to search HSN codes", e))?;

        timer.observe_duration();

        Ok(codes)
    }

    // -------------------------------------------------------------------------
    // Tax Profile Operations
    // -------------------------------------------------------------------------

    /// Create a new tax profile. Setting `is_default` clears the flag on
    /// every other profile in the same transaction.
    #[instrument(skip(self, input))]
    pub async fn create_tax_profile(
        &self,
        input: &CreateTaxProfile,
    ) -> Result<TaxProfile, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_tax_profile"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        if input.is_default {
            sqlx::query("UPDATE tax_profiles SET is_default = FALSE WHERE is_default")
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error("Failed to clear default tax profiles", e))?;
        }

        let hsn_code = input.hsn_code.as_deref().map(format_hsn_sac_code);
        let tax_profile_id = Uuid::new_v4();
        let profile = sqlx::query_as::<_, TaxProfile>(&format!(
            r#"
            INSERT INTO tax_profiles (
                tax_profile_id, name, description, tax_type, tax_rate, hsn_code,
                is_default, applies_to, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE)
            RETURNING {TAX_PROFILE_COLUMNS}
            "#
        ))
        .bind(tax_profile_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.tax_type)
        .bind(input.tax_rate)
        .bind(hsn_code)
        .bind(input.is_default)
        .bind(input.applies_to.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Tax profile '{}' already exists",
                    input.name
                ))
            }
            _ => db_error("Failed to create tax profile", e),
        })?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        timer.observe_duration();

        info!(tax_profile_id = %profile.id, name = %profile.name, "Tax profile created");

        Ok(profile)
    }

    /// Update a tax profile. Setting `is_default` clears the flag on every
    /// other profile in the same transaction.
    #[instrument(skip(self, input), fields(tax_profile_id = %tax_profile_id))]
    pub async fn update_tax_profile(
        &self,
        tax_profile_id: Uuid,
        input: &UpdateTaxProfile,
    ) -> Result<Option<TaxProfile>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_tax_profile"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        if input.is_default == Some(true) {
            sqlx::query(
                "UPDATE tax_profiles SET is_default = FALSE WHERE is_default AND tax_profile_id <> $1",
            )
            .bind(tax_profile_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to clear default tax profiles", e))?;
        }

        let hsn_code = input.hsn_code.as_deref().map(format_hsn_sac_code);
        let applies_to = input.applies_to.map(|a| a.as_str().to_string());
        let profile = sqlx::query_as::<_, TaxProfile>(&format!(
            r#"
            UPDATE tax_profiles
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                tax_type = COALESCE($4, tax_type),
                tax_rate = COALESCE($5, tax_rate),
                hsn_code = COALESCE($6, hsn_code),
                is_default = COALESCE($7, is_default),
                applies_to = COALESCE($8, applies_to),
                is_active = COALESCE($9, is_active)
            WHERE tax_profile_id = $1
            RETURNING {TAX_PROFILE_COLUMNS}
            "#
        ))
        .bind(tax_profile_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.tax_type)
        .bind(input.tax_rate)
        .bind(hsn_code)
        .bind(input.is_default)
        .bind(applies_to)
        .bind(input.is_active)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to update tax profile", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        timer.observe_duration();

        if let Some(ref p) = profile {
            info!(tax_profile_id = %p.id, "Tax profile updated");
        }

        Ok(profile)
    }

    /// List tax profiles.
    #[instrument(skip(self))]
    pub async fn list_tax_profiles(&self, active_only: bool) -> Result<Vec<TaxProfile>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_tax_profiles"])
            .start_timer();

        let profiles = sqlx::query_as::<_, TaxProfile>(&format!(
            r#"
            SELECT {TAX_PROFILE_COLUMNS}
            FROM tax_profiles
            WHERE ($1::bool = FALSE OR is_active = TRUE)
            ORDER BY name
            "#
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list tax profiles", e))?;

        timer.observe_duration();

        Ok(profiles)
    }

    /// Get a tax profile by ID.
    #[instrument(skip(self), fields(tax_profile_id = %tax_profile_id))]
    pub async fn get_tax_profile(
        &self,
        tax_profile_id: Uuid,
    ) -> Result<Option<TaxProfile>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_tax_profile"])
            .start_timer();

        let profile = sqlx::query_as::<_, TaxProfile>(&format!(
            "SELECT {TAX_PROFILE_COLUMNS} FROM tax_profiles WHERE tax_profile_id = $1"
        ))
        .bind(tax_profile_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get tax profile", e))?;

        timer.observe_duration();

        Ok(profile)
    }

    /// Get the default tax profile.
    ///
    /// Falls back to the synthesized `temp_default` (18% GST, both) when no
    /// persisted profile carries the flag. Storage failures propagate; only a
    /// genuine "no default configured" triggers the fallback.
    #[instrument(skip(self))]
    pub async fn get_default_tax_profile(&self) -> Result<TaxProfile, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_default_tax_profile"])
            .start_timer();

        let profile = sqlx::query_as::<_, TaxProfile>(&format!(
            "SELECT {TAX_PROFILE_COLUMNS} FROM tax_profiles WHERE is_default AND is_active LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get default tax profile", e))?;

        timer.observe_duration();

        Ok(profile.unwrap_or_else(TaxProfile::temp_default))
    }

    /// Look up the tax profile for an HSN/SAC code.
    ///
    /// An active profile explicitly linked to the code wins; otherwise an
    /// active HSN record is synthesized into an ephemeral `temp_<code>`
    /// profile; otherwise `None`.
    #[instrument(skip(self))]
    pub async fn get_tax_profile_by_hsn_code(
        &self,
        code: &str,
    ) -> Result<Option<TaxProfile>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_tax_profile_by_hsn_code"])
            .start_timer();

        let code = format_hsn_sac_code(code);

        let profile = sqlx::query_as::<_, TaxProfile>(&format!(
            r#"
            SELECT {TAX_PROFILE_COLUMNS}
            FROM tax_profiles
            WHERE hsn_code = $1 AND is_active
            ORDER BY created_utc
            LIMIT 1
            "#
        ))
        .bind(&code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get tax profile by HSN code", e))?;

        if profile.is_some() {
            timer.observe_duration();
            return Ok(profile);
        }

        let hsn = sqlx::query_as::<_, HsnCode>(
            r#"
            SELECT hsn_code_id, code, description, gst_rate, is_service, is_active, created_utc
            FROM hsn_codes
            WHERE code = $1 AND is_active
            "#,
        )
        .bind(&code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get HSN code", e))?;

        timer.observe_duration();

        Ok(hsn.map(|h| TaxProfile::from_hsn(&h)))
    }

    /// Delete a tax profile. The flagged default cannot be deleted.
    #[instrument(skip(self), fields(tax_profile_id = %tax_profile_id))]
    pub async fn delete_tax_profile(&self, tax_profile_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_tax_profile"])
            .start_timer();

        let is_default: Option<bool> =
            sqlx::query_scalar("SELECT is_default FROM tax_profiles WHERE tax_profile_id = $1")
                .bind(tax_profile_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to get tax profile", e))?;

        match is_default {
            None => return Ok(false),
            Some(true) => {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Cannot delete the default tax profile"
                )))
            }
            Some(false) => {}
        }

        let result = sqlx::query("DELETE FROM tax_profiles WHERE tax_profile_id = $1")
            .bind(tax_profile_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete tax profile", e))?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(tax_profile_id = %tax_profile_id, "Tax profile deleted");
        }

        Ok(deleted)
    }
}
