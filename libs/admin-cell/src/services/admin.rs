use tracing::debug;

use shared_database::repository::{appointments, doctors, patients, users};
use shared_database::{AppState, Database};
use shared_models::{Role, User};

use crate::models::{AdminDashboard, AdminError};

pub struct AdminService {
    db: Database,
}

impl AdminService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }

    pub async fn dashboard(&self) -> Result<AdminDashboard, AdminError> {
        debug!("Building admin dashboard");

        self.db
            .call(|conn| {
                Ok::<_, AdminError>(AdminDashboard {
                    total_doctors: doctors::count_visible(conn)?,
                    total_patients: users::count_by_role(conn, Role::Patient)?,
                    total_appointments: appointments::count(conn)?,
                    doctors: doctors::list_visible(conn)?,
                    patients: patients::list_with_users(conn)?,
                    appointments: appointments::with_visible_doctors(conn)?,
                })
            })
            .await
    }

    /// Case-insensitive substring match on username or email. A blank query
    /// matches every visible account.
    pub async fn search(&self, query: &str) -> Result<Vec<User>, AdminError> {
        let query = query.trim();
        debug!("Admin search for '{}'", query);

        Ok(self.db.call(|conn| users::search(conn, query)).await?)
    }
}
