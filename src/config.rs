use std::env;

/// Credentials and endpoints of the VFD banking-as-a-service API.
#[derive(Debug, Clone)]
pub struct VfdConfig {
    pub base_url: String,
    pub auth_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub webhook_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub vfd: VfdConfig,
    pub encryption_key: Vec<u8>,
    pub default_currency: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        Self::from_source(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup (environment, test map).
    pub fn from_source<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
        where F: Fn(&str) -> Option<String>
    {
        let required = |key: &str| -> Result<String, Box<dyn std::error::Error>> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| format!("{} must be set", key).into())
        };

        let database_url = required("DATABASE_URL")?;

        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let server_port = lookup("SERVER_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| "SERVER_PORT must be a valid port number")?;

        let supabase_url = Self::normalize_url(&required("SUPABASE_URL")?);
        let supabase_anon_key = required("SUPABASE_ANON_KEY")?;

        let vfd = VfdConfig {
            base_url: Self::normalize_url(&required("VFD_BASE_URL")?),
            auth_url: Self::normalize_url(&required("VFD_AUTH_URL")?),
            consumer_key: required("VFD_CONSUMER_KEY")?,
            consumer_secret: required("VFD_CONSUMER_SECRET")?,
            webhook_secret: required("VFD_WEBHOOK_SECRET")?,
        };

        let encryption_key_hex = required("ENCRYPTION_KEY")?;
        let encryption_key = hex
            ::decode(&encryption_key_hex)
            .map_err(|_| "ENCRYPTION_KEY must be a valid hex string")?;

        if encryption_key.len() != 32 {
            return Err("ENCRYPTION_KEY must be 32 bytes (64 hex characters)".into());
        }

        let default_currency = lookup("DEFAULT_CURRENCY")
            .unwrap_or_else(|| "NGN".to_string())
            .to_uppercase();

        if default_currency.len() != 3 {
            return Err("DEFAULT_CURRENCY must be a 3-letter ISO code".into());
        }

        Ok(Config {
            database_url,
            server_host,
            server_port,
            supabase_url,
            supabase_anon_key,
            vfd,
            encryption_key,
            default_currency,
        })
    }

    fn normalize_url(url: &str) -> String {
        url.trim().trim_end_matches('/').to_string()
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/assura".to_string()),
            ("SUPABASE_URL", "https://project.supabase.co/".to_string()),
            ("SUPABASE_ANON_KEY", "anon".to_string()),
            ("VFD_BASE_URL", "https://api-devapps.vfdbank.systems/vtech-wallet/api/v1/wallet2".to_string()),
            ("VFD_AUTH_URL", "https://api-devapps.vfdbank.systems/vfd-tech/baas-portal/v1.1".to_string()),
            ("VFD_CONSUMER_KEY", "key".to_string()),
            ("VFD_CONSUMER_SECRET", "secret".to_string()),
            ("VFD_WEBHOOK_SECRET", "whsec".to_string()),
            ("ENCRYPTION_KEY", "00".repeat(32)),
        ])
    }

    #[test]
    fn test_defaults_applied() {
        let vars = base_vars();
        let config = Config::from_source(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.default_currency, "NGN");
        assert_eq!(config.supabase_url, "https://project.supabase.co");
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_required_variable() {
        let mut vars = base_vars();
        vars.remove("VFD_WEBHOOK_SECRET");

        let err = Config::from_source(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("VFD_WEBHOOK_SECRET"));
    }

    #[test]
    fn test_short_encryption_key_rejected() {
        let mut vars = base_vars();
        vars.insert("ENCRYPTION_KEY", "abcd".to_string());

        assert!(Config::from_source(|k| vars.get(k).cloned()).is_err());
    }
}
