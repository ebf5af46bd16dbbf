use clap::Parser;
use snapspot_types::{claim::Role, config::BackendConfig, general::ValidEmail};

use crate::commands::Executor;

#[derive(Parser, Debug)]
pub struct CreateUserCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "User name")]
    name: String,
    #[arg(short, long, help = "User email, used as username")]
    pub email: ValidEmail,
    #[arg(short, long, help = "User password")]
    pub password: Option<String>,
    #[arg(short, long, num_args=0..,
        value_delimiter = ',', help = "Roles of the user, comma separated or used multiple times, currently admin,user roles are supported, not hierarchical - add all roles to the user")]
    pub roles: Vec<Role>,
}

impl Executor for CreateUserCmd {
    async fn run(self) -> anyhow::Result<()> {
        let db_url = self.backend.database_url();
        let pool = snapspot_dal::new_pool(&db_url).await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;
        let repository = snapspot_dal::user::UserRepository::new(pool);
        let roles: Vec<String> = self.roles.iter().map(|r| r.to_string()).collect();
        let new_user = snapspot_dal::user::CreateUser {
            name: self.name,
            email: self.email,
            password: self.password,
            profile_picture: None,
            roles: if roles.is_empty() { None } else { Some(roles) },
        };
        repository.create(new_user).await?;

        Ok(())
    }
}
