pub mod config {
    use serde::Deserialize;
    use std::path::PathBuf;

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        #[serde(default = "default_bind_address")]
        pub bind_address: String,
        #[serde(default = "default_port")]
        pub port: u16,
        #[serde(default = "default_tasks_file")]
        pub tasks_file: PathBuf,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_environment(config::Environment::default().try_parsing(true))
        }

        fn from_environment(environment: config::Environment) -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(environment)
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }

        pub fn server_address(&self) -> String {
            format!("{}:{}", self.bind_address, self.port)
        }
    }

    fn default_bind_address() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_tasks_file() -> PathBuf {
        PathBuf::from("tasks.json")
    }

}
pub mod task;

pub mod web;
