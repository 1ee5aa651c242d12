use tracing::info;

use shared_config::AppConfig;
use shared_models::Role;

use crate::repository::{departments, users};
use crate::{Database, DatabaseError};

pub const DEFAULT_DEPARTMENTS: [(&str, &str); 5] = [
    ("Cardiology", "Heart and cardiovascular system"),
    ("Neurology", "Nervous system"),
    ("Oncology", "Cancer treatment"),
    ("Orthopedics", "Bones and muscles"),
    ("General Medicine", "General health"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub departments_seeded: usize,
}

/// Ensure an admin account and the default departments exist. Safe to run
/// on every startup.
pub async fn bootstrap(db: &Database, config: &AppConfig) -> Result<SeedReport, DatabaseError> {
    let report = db
        .transaction(|conn| {
            let admin_created = if users::find_first_by_role(conn, Role::Admin)?.is_none() {
                users::insert_user(
                    conn,
                    &users::NewUser {
                        username: &config.admin_username,
                        email: &config.admin_email,
                        password: &config.admin_password,
                        role: Role::Admin,
                        contact: Some(&config.admin_contact),
                        age: None,
                        gender: None,
                    },
                )?;
                true
            } else {
                false
            };

            let mut departments_seeded = 0;
            if departments::count(conn)? == 0 {
                for (name, description) in DEFAULT_DEPARTMENTS {
                    departments::insert(conn, name, Some(description))?;
                    departments_seeded += 1;
                }
            }

            Ok::<_, DatabaseError>(SeedReport {
                admin_created,
                departments_seeded,
            })
        })
        .await?;

    if report.admin_created {
        info!("Bootstrap admin account created");
    }
    if report.departments_seeded > 0 {
        info!("Seeded {} departments", report.departments_seeded);
    }
    info!("Database setup complete. Admin user ensured.");

    Ok(report)
}
