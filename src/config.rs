use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,

    pub google_credentials: Option<String>,
    pub google_credentials_file: PathBuf,

    pub spreadsheet_name: String,
    pub spreadsheet_id: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".into())
                .parse()
                .map_err(|e| anyhow::anyhow!("PORT must be a number: {}", e))?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_default(),

            google_credentials: env::var("GOOGLE_CREDENTIALS")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            google_credentials_file: env::var("GOOGLE_CREDENTIALS_FILE")
                .unwrap_or_else(|_| "credentials.json".into())
                .into(),

            spreadsheet_name: env::var("SPREADSHEET_NAME")
                .unwrap_or_else(|_| "Entrenamiento".into()),
            spreadsheet_id: env::var("SPREADSHEET_ID").ok().filter(|s| !s.is_empty()),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_skips_blanks() {
        let origins = parse_origins(" http://localhost:3000, ,http://192.168.1.10:3000,");
        assert_eq!(
            origins,
            vec!["http://localhost:3000", "http://192.168.1.10:3000"]
        );
    }

    #[test]
    fn test_listen_addr() {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 5000,
            cors_allowed_origins: vec![],
            google_credentials: None,
            google_credentials_file: "credentials.json".into(),
            spreadsheet_name: "Entrenamiento".into(),
            spreadsheet_id: None,
        };
        assert_eq!(config.listen_addr(), "127.0.0.1:5000");
    }
}
