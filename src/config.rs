use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Public origin used to build the gateway callback URL.
    pub public_base_url: String,
    pub gateway: GatewayConfig,
    pub orders: OrderConfig,
    pub otp: OtpConfig,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub merchant_id: Option<String>,
    pub api_base: String,
    pub start_pay_base: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct OrderConfig {
    pub expiry_minutes: i64,
    pub shipping_standard_cost: i64,
    pub shipping_express_cost: i64,
}

#[derive(Debug, Clone)]
pub struct OtpConfig {
    pub expiry_minutes: i64,
    pub max_per_hour: i64,
    pub max_per_day: i64,
    /// Return the generated code in the response instead of relying on SMS.
    pub echo: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env_parse("APP_PORT", 3000);
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}"));

        let sandbox = env_parse("ZARINPAL_SANDBOX", true);
        let (default_api, default_start) = if sandbox {
            (
                "https://sandbox.zarinpal.com/pg/v4",
                "https://sandbox.zarinpal.com/pg",
            )
        } else {
            ("https://api.zarinpal.com/pg/v4", "https://www.zarinpal.com/pg")
        };
        let gateway = GatewayConfig {
            merchant_id: env::var("ZARINPAL_MERCHANT_ID")
                .ok()
                .filter(|m| !m.trim().is_empty()),
            api_base: env::var("ZARINPAL_API_BASE").unwrap_or_else(|_| default_api.to_string()),
            start_pay_base: env::var("ZARINPAL_START_PAY_BASE")
                .unwrap_or_else(|_| default_start.to_string()),
            timeout_secs: env_parse("GATEWAY_TIMEOUT_SECS", 10),
        };

        let orders = OrderConfig {
            expiry_minutes: env_parse("ORDER_EXPIRY_MINUTES", 60),
            shipping_standard_cost: env_parse("SHIPPING_STANDARD_COST", 19_000),
            shipping_express_cost: env_parse("SHIPPING_EXPRESS_COST", 32_000),
        };

        let otp = OtpConfig {
            expiry_minutes: env_parse("OTP_EXPIRY_MINUTES", 2),
            max_per_hour: env_parse("OTP_MAX_PER_HOUR", 5),
            max_per_day: env_parse("OTP_MAX_PER_DAY", 10),
            echo: env_parse("OTP_ECHO", false),
        };

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            public_base_url,
            gateway,
            orders,
            otp,
        })
    }

    pub fn callback_url(&self) -> String {
        format!(
            "{}/api/payments/callback",
            self.public_base_url.trim_end_matches('/')
        )
    }
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            expiry_minutes: 60,
            shipping_standard_cost: 19_000,
            shipping_express_cost: 32_000,
        }
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            expiry_minutes: 2,
            max_per_hour: 5,
            max_per_day: 10,
            echo: false,
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
