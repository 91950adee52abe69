use super::parse_bool_env;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub public_read: RateLimitRule,
    pub write: RateLimitRule,
    pub admin: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            public_read: RateLimitRule::new(30, 60),
            write: RateLimitRule::new(5, 10),
            admin: RateLimitRule::new(10, 20),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = parse_bool_env("RATE_LIMIT_ENABLED", cfg.enabled);

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            match parse_overrides(&raw) {
                Ok(overrides) => cfg = cfg.apply(&overrides),
                Err(err) => {
                    tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
                }
            }
        }

        cfg
    }

    fn set(&mut self, group: Group, rule: RateLimitRule) {
        match group {
            Group::PublicRead => self.public_read = rule,
            Group::Write => self.write = rule,
            Group::Admin => self.admin = rule,
        }
    }

    fn apply(mut self, overrides: &[(Option<Group>, RateLimitRule)]) -> Self {
        for &(group, rule) in overrides {
            match group {
                Some(group) => self.set(group, rule),
                None => {
                    for group in Group::ALL {
                        self.set(group, rule);
                    }
                }
            }
        }
        self
    }
}

/// Router groups that get their own governor layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    PublicRead,
    Write,
    Admin,
}

impl Group {
    const ALL: [Group; 3] = [Group::PublicRead, Group::Write, Group::Admin];

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "public" | "public_read" | "public-read" | "read" => Some(Self::PublicRead),
            "write" | "user" => Some(Self::Write),
            "admin" | "moderation" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Accepts either a bare `per:burst` applied everywhere, or a comma list of
/// `group=per:burst` entries. `None` in the result means every group.
fn parse_overrides(raw: &str) -> Result<Vec<(Option<Group>, RateLimitRule)>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty value".to_string());
    }
    if !trimmed.contains('=') {
        return Ok(vec![(None, parse_rule(trimmed)?)]);
    }

    trimmed
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (name, rule) = item
                .split_once('=')
                .ok_or_else(|| format!("invalid item '{}', expected name=per:burst", item))?;
            let group = Group::from_name(name.trim()).ok_or_else(|| {
                format!(
                    "unknown group '{}', expected public/write/admin",
                    name.trim()
                )
            })?;
            Ok((Some(group), parse_rule(rule.trim())?))
        })
        .collect()
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per_second, burst_size) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw))?;
    let per_second = positive::<u64>("per_second", per_second)?;
    let burst_size = positive::<u32>("burst_size", burst_size)?;
    Ok(RateLimitRule::new(per_second, burst_size))
}

fn positive<T>(field: &str, raw: &str) -> Result<T, String>
where
    T: std::str::FromStr + Default + PartialEq,
{
    let value: T = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid {} '{}'", field, raw.trim()))?;
    if value == T::default() {
        return Err(format!("{} must be > 0", field));
    }
    Ok(value)
}
