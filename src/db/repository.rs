//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity. All
//! resource operations are scoped by organization id.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    Build, BuildKind, BuildTagAssignment, CompletionRecord, CreateBuildRequest,
    CreateMemberRequest, CreateOrganizationRequest, CreateTagRequest, LocalizedText, Member,
    MemberRole, MemberTagAssignment, Organization, RecordCompletionRequest, RevisionInfo,
    TagPriority, TrainingTag, UpdateBuildRequest, UpdateMemberRequest, UpdateTagRequest,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    // ==================== ORGANIZATION OPERATIONS ====================

    /// List all organizations.
    pub async fn list_organizations(&self) -> Result<Vec<Organization>, AppError> {
        let rows = sqlx::query("SELECT id, name, created_at FROM organizations ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(organization_from_row).collect())
    }

    /// Get an organization by ID.
    pub async fn get_organization(&self, id: &str) -> Result<Option<Organization>, AppError> {
        let row = sqlx::query("SELECT id, name, created_at FROM organizations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(organization_from_row))
    }

    /// Create a new organization.
    pub async fn create_organization(
        &self,
        request: &CreateOrganizationRequest,
    ) -> Result<Organization, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO organizations (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(&request.name)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;

        Ok(Organization {
            id,
            name: request.name.clone(),
            created_at: now,
        })
    }

    /// Delete an organization and everything scoped to it.
    pub async fn delete_organization(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM organizations WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Organization {} not found", id)));
        }

        for table in [
            "completions",
            "build_tags",
            "member_tags",
            "builds",
            "tags",
            "members",
        ] {
            sqlx::query(&format!("DELETE FROM {} WHERE org_id = ?", table))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        bump_revision_in_tx(&mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    // ==================== MEMBER OPERATIONS ====================

    /// List all members of an organization.
    pub async fn list_members(&self, org_id: &str) -> Result<Vec<Member>, AppError> {
        let rows = sqlx::query(
            "SELECT id, org_id, display_name, email, role, joined_at, version FROM members WHERE org_id = ? ORDER BY display_name"
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(member_from_row).collect())
    }

    /// Get a member by ID.
    pub async fn get_member(&self, org_id: &str, id: &str) -> Result<Option<Member>, AppError> {
        let row = sqlx::query(
            "SELECT id, org_id, display_name, email, role, joined_at, version FROM members WHERE org_id = ? AND id = ?"
        )
        .bind(org_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(member_from_row))
    }

    /// Create a new member.
    pub async fn create_member(
        &self,
        org_id: &str,
        request: &CreateMemberRequest,
    ) -> Result<Member, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO members (id, org_id, display_name, email, role, joined_at, version) VALUES (?, ?, ?, ?, ?, ?, 1)"
        )
        .bind(&id)
        .bind(org_id)
        .bind(&request.display_name)
        .bind(&request.email)
        .bind(request.role.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Member {
            id,
            org_id: org_id.to_string(),
            display_name: request.display_name.clone(),
            email: request.email.clone(),
            role: request.role,
            joined_at: now,
            version: 1,
        })
    }

    /// Update a member with optimistic concurrency control.
    pub async fn update_member(
        &self,
        org_id: &str,
        id: &str,
        request: &UpdateMemberRequest,
    ) -> Result<Member, AppError> {
        let existing = self
            .get_member(org_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))?;

        // Check version for optimistic concurrency
        if let Some(expected) = request.expected_version {
            if existing.version != expected {
                return Err(AppError::Conflict {
                    message: format!(
                        "Version mismatch: expected {}, current {}",
                        expected, existing.version
                    ),
                    current_version: existing.version,
                });
            }
        }

        let new_version = existing.version + 1;

        let display_name = request
            .display_name
            .as_ref()
            .unwrap_or(&existing.display_name);
        let email = request.email.clone().or(existing.email.clone());
        let role = request.role.unwrap_or(existing.role);

        // Use conditional UPDATE with version check to prevent race conditions
        let result = sqlx::query(
            "UPDATE members SET display_name = ?, email = ?, role = ?, version = ? WHERE org_id = ? AND id = ? AND version = ?"
        )
        .bind(display_name)
        .bind(&email)
        .bind(role.as_str())
        .bind(new_version)
        .bind(org_id)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Race condition - version changed between read and write
            let current = self.get_member(org_id, id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|m| m.version).unwrap_or(0),
            });
        }

        self.increment_revision().await?;

        Ok(Member {
            id: id.to_string(),
            org_id: org_id.to_string(),
            display_name: display_name.clone(),
            email,
            role,
            joined_at: existing.joined_at,
            version: new_version,
        })
    }

    /// Delete a member along with their tag assignments.
    ///
    /// Completion records are analytics history and are retained.
    pub async fn delete_member(&self, org_id: &str, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM members WHERE org_id = ? AND id = ?")
            .bind(org_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Member {} not found", id)));
        }

        sqlx::query("DELETE FROM member_tags WHERE org_id = ? AND member_id = ?")
            .bind(org_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        bump_revision_in_tx(&mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    // ==================== TAG OPERATIONS ====================

    /// List all training tags of an organization.
    pub async fn list_tags(&self, org_id: &str) -> Result<Vec<TrainingTag>, AppError> {
        let rows = sqlx::query(
            "SELECT id, org_id, name, color, priority, due_date, created_at, modified_at, version FROM tags WHERE org_id = ? ORDER BY name"
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(tag_from_row).collect())
    }

    /// Get a training tag by ID.
    pub async fn get_tag(&self, org_id: &str, id: &str) -> Result<Option<TrainingTag>, AppError> {
        let row = sqlx::query(
            "SELECT id, org_id, name, color, priority, due_date, created_at, modified_at, version FROM tags WHERE org_id = ? AND id = ?"
        )
        .bind(org_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(tag_from_row))
    }

    /// Create a new training tag.
    pub async fn create_tag(
        &self,
        org_id: &str,
        request: &CreateTagRequest,
    ) -> Result<TrainingTag, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO tags (id, org_id, name, color, priority, due_date, created_at, modified_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)"
        )
        .bind(&id)
        .bind(org_id)
        .bind(&request.name)
        .bind(&request.color)
        .bind(request.priority.as_str())
        .bind(request.due_date.map(|d| d.to_rfc3339()))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(TrainingTag {
            id,
            org_id: org_id.to_string(),
            name: request.name.clone(),
            color: request.color.clone(),
            priority: request.priority,
            due_date: request.due_date,
            created_at: now.clone(),
            modified_at: now,
            version: 1,
        })
    }

    /// Update a training tag with optimistic concurrency control.
    pub async fn update_tag(
        &self,
        org_id: &str,
        id: &str,
        request: &UpdateTagRequest,
    ) -> Result<TrainingTag, AppError> {
        let existing = self
            .get_tag(org_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag {} not found", id)))?;

        // Check version for optimistic concurrency
        if let Some(expected) = request.expected_version {
            if existing.version != expected {
                return Err(AppError::Conflict {
                    message: format!(
                        "Version mismatch: expected {}, current {}",
                        expected, existing.version
                    ),
                    current_version: existing.version,
                });
            }
        }

        let now = Utc::now().to_rfc3339();
        let new_version = existing.version + 1;

        let name = request.name.as_ref().unwrap_or(&existing.name);
        let color = request.color.clone().or(existing.color.clone());
        let priority = request.priority.unwrap_or(existing.priority);
        let due_date = request.due_date.or(existing.due_date);

        let result = sqlx::query(
            "UPDATE tags SET name = ?, color = ?, priority = ?, due_date = ?, modified_at = ?, version = ? WHERE org_id = ? AND id = ? AND version = ?"
        )
        .bind(name)
        .bind(&color)
        .bind(priority.as_str())
        .bind(due_date.map(|d| d.to_rfc3339()))
        .bind(&now)
        .bind(new_version)
        .bind(org_id)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_tag(org_id, id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|t| t.version).unwrap_or(0),
            });
        }

        self.increment_revision().await?;

        Ok(TrainingTag {
            id: id.to_string(),
            org_id: org_id.to_string(),
            name: name.clone(),
            color,
            priority,
            due_date,
            created_at: existing.created_at,
            modified_at: now,
            version: new_version,
        })
    }

    /// Delete a training tag, cascading to its assignments.
    pub async fn delete_tag(&self, org_id: &str, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM tags WHERE org_id = ? AND id = ?")
            .bind(org_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tag {} not found", id)));
        }

        sqlx::query("DELETE FROM member_tags WHERE org_id = ? AND tag_id = ?")
            .bind(org_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM build_tags WHERE org_id = ? AND tag_id = ?")
            .bind(org_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        bump_revision_in_tx(&mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    // ==================== BUILD OPERATIONS ====================

    /// List all builds of an organization.
    pub async fn list_builds(&self, org_id: &str) -> Result<Vec<Build>, AppError> {
        let rows = sqlx::query(
            "SELECT org_id, name, kind, title, description, created_at, modified_at, version FROM builds WHERE org_id = ? ORDER BY name"
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(build_from_row).collect())
    }

    /// Get a build by name.
    pub async fn get_build(&self, org_id: &str, name: &str) -> Result<Option<Build>, AppError> {
        let row = sqlx::query(
            "SELECT org_id, name, kind, title, description, created_at, modified_at, version FROM builds WHERE org_id = ? AND name = ?"
        )
        .bind(org_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(build_from_row))
    }

    /// Register a new build.
    pub async fn create_build(
        &self,
        org_id: &str,
        request: &CreateBuildRequest,
    ) -> Result<Build, AppError> {
        if self.get_build(org_id, &request.name).await?.is_some() {
            return Err(AppError::Validation(format!(
                "Build {} already exists",
                request.name
            )));
        }

        let now = Utc::now().to_rfc3339();
        let title_json = localized_to_json(&request.title)?;
        let description_json = localized_to_json(&request.description)?;

        sqlx::query(
            "INSERT INTO builds (org_id, name, kind, title, description, created_at, modified_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, 1)"
        )
        .bind(org_id)
        .bind(&request.name)
        .bind(request.kind.as_str())
        .bind(&title_json)
        .bind(&description_json)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Build {
            org_id: org_id.to_string(),
            name: request.name.clone(),
            kind: request.kind,
            title: request.title.clone(),
            description: request.description.clone(),
            created_at: now.clone(),
            modified_at: now,
            version: 1,
        })
    }

    /// Update build metadata with optimistic concurrency control.
    pub async fn update_build(
        &self,
        org_id: &str,
        name: &str,
        request: &UpdateBuildRequest,
    ) -> Result<Build, AppError> {
        let existing = self
            .get_build(org_id, name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Build {} not found", name)))?;

        // Check version for optimistic concurrency
        if let Some(expected) = request.expected_version {
            if existing.version != expected {
                return Err(AppError::Conflict {
                    message: format!(
                        "Version mismatch: expected {}, current {}",
                        expected, existing.version
                    ),
                    current_version: existing.version,
                });
            }
        }

        let now = Utc::now().to_rfc3339();
        let new_version = existing.version + 1;

        let kind = request.kind.unwrap_or(existing.kind);
        let title = request.title.clone().or(existing.title.clone());
        let description = request.description.clone().or(existing.description.clone());
        let title_json = localized_to_json(&title)?;
        let description_json = localized_to_json(&description)?;

        let result = sqlx::query(
            "UPDATE builds SET kind = ?, title = ?, description = ?, modified_at = ?, version = ? WHERE org_id = ? AND name = ? AND version = ?"
        )
        .bind(kind.as_str())
        .bind(&title_json)
        .bind(&description_json)
        .bind(&now)
        .bind(new_version)
        .bind(org_id)
        .bind(name)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_build(org_id, name).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|b| b.version).unwrap_or(0),
            });
        }

        self.increment_revision().await?;

        Ok(Build {
            org_id: org_id.to_string(),
            name: name.to_string(),
            kind,
            title,
            description,
            created_at: existing.created_at,
            modified_at: now,
            version: new_version,
        })
    }

    /// Delete a build, cascading to its tag assignments.
    pub async fn delete_build(&self, org_id: &str, name: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM builds WHERE org_id = ? AND name = ?")
            .bind(org_id)
            .bind(name)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Build {} not found", name)));
        }

        sqlx::query("DELETE FROM build_tags WHERE org_id = ? AND build_name = ?")
            .bind(org_id)
            .bind(name)
            .execute(&mut *tx)
            .await?;

        bump_revision_in_tx(&mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    // ==================== ASSIGNMENT OPERATIONS ====================

    /// List all member-tag assignments of an organization.
    pub async fn list_member_assignments(
        &self,
        org_id: &str,
    ) -> Result<Vec<MemberTagAssignment>, AppError> {
        let rows = sqlx::query(
            "SELECT member_id, tag_id, assigned_at FROM member_tags WHERE org_id = ? ORDER BY assigned_at"
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| MemberTagAssignment {
                member_id: row.get("member_id"),
                tag_id: row.get("tag_id"),
                assigned_at: row.get("assigned_at"),
            })
            .collect())
    }

    /// List all build-tag assignments of an organization.
    pub async fn list_build_assignments(
        &self,
        org_id: &str,
    ) -> Result<Vec<BuildTagAssignment>, AppError> {
        let rows = sqlx::query(
            "SELECT build_name, tag_id, assigned_at FROM build_tags WHERE org_id = ? ORDER BY assigned_at"
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| BuildTagAssignment {
                build_name: row.get("build_name"),
                tag_id: row.get("tag_id"),
                assigned_at: row.get("assigned_at"),
            })
            .collect())
    }

    /// Bulk-assign the cross-product of members × tags in one transaction.
    ///
    /// Existing pairs are left untouched, so retries are idempotent. Returns
    /// the number of join rows actually created.
    pub async fn assign_member_tags(
        &self,
        org_id: &str,
        member_ids: &[String],
        tag_ids: &[String],
    ) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        for member_id in member_ids {
            let exists = sqlx::query("SELECT 1 FROM members WHERE org_id = ? AND id = ?")
                .bind(org_id)
                .bind(member_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(AppError::NotFound(format!(
                    "Member {} not found",
                    member_id
                )));
            }
        }
        for tag_id in tag_ids {
            let exists = sqlx::query("SELECT 1 FROM tags WHERE org_id = ? AND id = ?")
                .bind(org_id)
                .bind(tag_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(AppError::NotFound(format!("Tag {} not found", tag_id)));
            }
        }

        let now = Utc::now().to_rfc3339();
        let mut affected = 0u64;
        for member_id in member_ids {
            for tag_id in tag_ids {
                let result = sqlx::query(
                    "INSERT OR IGNORE INTO member_tags (org_id, member_id, tag_id, assigned_at) VALUES (?, ?, ?, ?)"
                )
                .bind(org_id)
                .bind(member_id)
                .bind(tag_id)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
                affected += result.rows_affected();
            }
        }

        bump_revision_in_tx(&mut tx).await?;
        tx.commit().await?;
        Ok(affected)
    }

    /// Bulk-remove the cross-product of members × tags in one transaction.
    pub async fn remove_member_tags(
        &self,
        org_id: &str,
        member_ids: &[String],
        tag_ids: &[String],
    ) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut affected = 0u64;
        for member_id in member_ids {
            for tag_id in tag_ids {
                let result = sqlx::query(
                    "DELETE FROM member_tags WHERE org_id = ? AND member_id = ? AND tag_id = ?",
                )
                .bind(org_id)
                .bind(member_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
                affected += result.rows_affected();
            }
        }

        bump_revision_in_tx(&mut tx).await?;
        tx.commit().await?;
        Ok(affected)
    }

    /// Bulk-assign the cross-product of builds × tags in one transaction.
    pub async fn assign_build_tags(
        &self,
        org_id: &str,
        build_names: &[String],
        tag_ids: &[String],
    ) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        for build_name in build_names {
            let exists = sqlx::query("SELECT 1 FROM builds WHERE org_id = ? AND name = ?")
                .bind(org_id)
                .bind(build_name)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(AppError::NotFound(format!(
                    "Build {} not found",
                    build_name
                )));
            }
        }
        for tag_id in tag_ids {
            let exists = sqlx::query("SELECT 1 FROM tags WHERE org_id = ? AND id = ?")
                .bind(org_id)
                .bind(tag_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(AppError::NotFound(format!("Tag {} not found", tag_id)));
            }
        }

        let now = Utc::now().to_rfc3339();
        let mut affected = 0u64;
        for build_name in build_names {
            for tag_id in tag_ids {
                let result = sqlx::query(
                    "INSERT OR IGNORE INTO build_tags (org_id, build_name, tag_id, assigned_at) VALUES (?, ?, ?, ?)"
                )
                .bind(org_id)
                .bind(build_name)
                .bind(tag_id)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
                affected += result.rows_affected();
            }
        }

        bump_revision_in_tx(&mut tx).await?;
        tx.commit().await?;
        Ok(affected)
    }

    /// Bulk-remove the cross-product of builds × tags in one transaction.
    pub async fn remove_build_tags(
        &self,
        org_id: &str,
        build_names: &[String],
        tag_ids: &[String],
    ) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut affected = 0u64;
        for build_name in build_names {
            for tag_id in tag_ids {
                let result = sqlx::query(
                    "DELETE FROM build_tags WHERE org_id = ? AND build_name = ? AND tag_id = ?",
                )
                .bind(org_id)
                .bind(build_name)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
                affected += result.rows_affected();
            }
        }

        bump_revision_in_tx(&mut tx).await?;
        tx.commit().await?;
        Ok(affected)
    }

    // ==================== COMPLETION OPERATIONS ====================

    /// List completion records, optionally filtered by completion status.
    pub async fn list_completions(
        &self,
        org_id: &str,
        completed: Option<bool>,
    ) -> Result<Vec<CompletionRecord>, AppError> {
        let rows = match completed {
            Some(flag) => {
                sqlx::query(
                    "SELECT id, member_id, build_name, completed, recorded_at FROM completions WHERE org_id = ? AND completed = ? ORDER BY recorded_at"
                )
                .bind(org_id)
                .bind(flag as i32)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, member_id, build_name, completed, recorded_at FROM completions WHERE org_id = ? ORDER BY recorded_at"
                )
                .bind(org_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(completion_from_row).collect())
    }

    /// Record an analytics completion event. Append-only.
    pub async fn record_completion(
        &self,
        org_id: &str,
        request: &RecordCompletionRequest,
    ) -> Result<CompletionRecord, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO completions (id, org_id, member_id, build_name, completed, recorded_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(org_id)
        .bind(&request.member_id)
        .bind(&request.build_name)
        .bind(request.completed as i32)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(CompletionRecord {
            id,
            member_id: request.member_id.clone(),
            build_name: request.build_name.clone(),
            completed: request.completed,
            recorded_at: now,
        })
    }
}

/// Increment the revision counter inside an open transaction.
///
/// Bulk operations and cascading deletes use this so the revision moves
/// exactly once per request.
async fn bump_revision_in_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
) -> Result<(), AppError> {
    let now = Utc::now().to_rfc3339();
    sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
        .bind(&now)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

// Helper functions for row conversion

fn organization_from_row(row: &sqlx::sqlite::SqliteRow) -> Organization {
    Organization {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

fn member_from_row(row: &sqlx::sqlite::SqliteRow) -> Member {
    let role: String = row.get("role");
    Member {
        id: row.get("id"),
        org_id: row.get("org_id"),
        display_name: row.get("display_name"),
        email: row.get("email"),
        role: MemberRole::from_str(&role).unwrap_or_default(),
        joined_at: row.get("joined_at"),
        version: row.get("version"),
    }
}

fn tag_from_row(row: &sqlx::sqlite::SqliteRow) -> TrainingTag {
    let priority: String = row.get("priority");
    let due_date: Option<String> = row.get("due_date");
    TrainingTag {
        id: row.get("id"),
        org_id: row.get("org_id"),
        name: row.get("name"),
        color: row.get("color"),
        priority: TagPriority::from_str(&priority).unwrap_or_default(),
        due_date: due_date.as_deref().and_then(parse_datetime),
        created_at: row.get("created_at"),
        modified_at: row.get("modified_at"),
        version: row.get("version"),
    }
}

fn build_from_row(row: &sqlx::sqlite::SqliteRow) -> Build {
    let kind: String = row.get("kind");
    let title: Option<String> = row.get("title");
    let description: Option<String> = row.get("description");
    Build {
        org_id: row.get("org_id"),
        name: row.get("name"),
        kind: BuildKind::from_str(&kind).unwrap_or(BuildKind::Wisetrainer),
        title: title.as_deref().and_then(parse_localized),
        description: description.as_deref().and_then(parse_localized),
        created_at: row.get("created_at"),
        modified_at: row.get("modified_at"),
        version: row.get("version"),
    }
}

fn completion_from_row(row: &sqlx::sqlite::SqliteRow) -> CompletionRecord {
    let completed: i32 = row.get("completed");
    CompletionRecord {
        id: row.get("id"),
        member_id: row.get("member_id"),
        build_name: row.get("build_name"),
        completed: completed != 0,
        recorded_at: row.get("recorded_at"),
    }
}

/// Parse a stored RFC 3339 timestamp; malformed values read back as absent.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Parse a stored localized-text JSON column; malformed values read back as absent.
fn parse_localized(s: &str) -> Option<LocalizedText> {
    serde_json::from_str(s).ok()
}

fn localized_to_json(text: &Option<LocalizedText>) -> Result<Option<String>, AppError> {
    text.as_ref()
        .map(|t| serde_json::to_string(t))
        .transpose()
        .map_err(AppError::from)
}
