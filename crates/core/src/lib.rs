pub mod domain;
pub mod ingest;
pub mod storage;

pub mod config {
    use anyhow::Context;

    /// Credentials and endpoint parameters read once at startup.
    ///
    /// Every field is optional: absent variables are passed through and only
    /// fail when the component that needs them asks via a `require_*` helper.
    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub rapidapi_key: Option<String>,
        pub snowflake_user: Option<String>,
        pub snowflake_password: Option<String>,
        pub snowflake_account: Option<String>,
        pub snowflake_warehouse: Option<String>,
        pub snowflake_database: Option<String>,
        pub snowflake_schema: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                rapidapi_key: std::env::var("rapidapi_key").ok(),
                // Read from `snowflake_username` but stored as `snowflake_user`.
                snowflake_user: std::env::var("snowflake_username").ok(),
                snowflake_password: std::env::var("snowflake_password").ok(),
                snowflake_account: std::env::var("snowflake_account").ok(),
                snowflake_warehouse: std::env::var("snowflake_warehouse").ok(),
                snowflake_database: std::env::var("snowflake_database").ok(),
                snowflake_schema: std::env::var("snowflake_schema").ok(),
            })
        }

        pub fn require_snowflake_username(&self) -> anyhow::Result<&str> {
            self.snowflake_user
                .as_deref()
                .context("snowflake_username is required")
        }

        pub fn require_snowflake_account(&self) -> anyhow::Result<&str> {
            self.snowflake_account
                .as_deref()
                .context("snowflake_account is required")
        }
    }

}
