use crate::config::types::{
    Config, CrawlerConfig, FiltersConfig, HealthConfig, LocalesConfig, OutputConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_locales_config(&config.locales)?;
    validate_filters_config(&config.filters)?;
    validate_health_config(&config.health)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl job configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_start_url(&config.start_url)?;

    // max_pages == 0 means unbounded, so any u32 is accepted

    if config.concurrency < 1 || config.concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 32, got {}",
            config.concurrency
        )));
    }

    if config.navigation_timeout < 1000 {
        return Err(ConfigError::Validation(format!(
            "navigation_timeout must be >= 1000ms, got {}ms",
            config.navigation_timeout
        )));
    }

    if config.navigation_retries > 5 {
        return Err(ConfigError::Validation(format!(
            "navigation_retries must be <= 5, got {}",
            config.navigation_retries
        )));
    }

    if let Some(filter) = &config.locale_filter {
        let filter = filter.trim().to_lowercase();
        if filter != "default" && !is_locale_code(&filter) {
            return Err(ConfigError::Validation(format!(
                "locale_filter must be 'default' or a locale code like 'de' or 'pt-br', got '{}'",
                filter
            )));
        }
    }

    if let Some(pattern) = &config.domain_scope {
        validate_domain_pattern(pattern)?;
    }

    Ok(())
}

/// Validates that the start URL is an absolute web URL with a host
fn validate_start_url(start_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(start_url.trim()).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid start_url '{}': {}", start_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "start_url '{}' must use http or https",
            start_url
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "start_url '{}' has no domain",
            start_url
        )));
    }

    Ok(())
}

/// Validates locale configuration
fn validate_locales_config(config: &LocalesConfig) -> Result<(), ConfigError> {
    for code in config.known.iter().chain(config.other.iter()) {
        let code = code.trim().trim_matches('/').to_lowercase();
        if !is_locale_code(&code) {
            return Err(ConfigError::Validation(format!(
                "'{}' is not a valid locale code",
                code
            )));
        }
    }
    Ok(())
}

/// Validates exclusion tables
fn validate_filters_config(config: &FiltersConfig) -> Result<(), ConfigError> {
    let all = config
        .excluded_paths
        .iter()
        .chain(config.excluded_extensions.iter())
        .chain(config.asset_extensions.iter())
        .chain(config.tracking_params.iter());

    for entry in all {
        if entry.trim().is_empty() {
            return Err(ConfigError::Validation(
                "filter entries cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates health checker configuration
fn validate_health_config(config: &HealthConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 || config.batch_size > 100 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and 100, got {}",
            config.batch_size
        )));
    }

    if config.head_timeout < 100 || config.get_timeout < 100 {
        return Err(ConfigError::Validation(format!(
            "head_timeout and get_timeout must be >= 100ms, got {}ms and {}ms",
            config.head_timeout, config.get_timeout
        )));
    }

    if config.max_links < 1 {
        return Err(ConfigError::Validation(
            "max_links must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("index_dir", &config.index_dir),
        ("report_dir", &config.report_dir),
        ("summary_path", &config.summary_path),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }
    Ok(())
}

/// Returns true for `xx` or `xx-yy`..`xx-yyyy` (lowercase ASCII)
fn is_locale_code(code: &str) -> bool {
    let (lang, region) = match code.split_once('-') {
        Some((lang, region)) => (lang, Some(region)),
        None => (code, None),
    };

    let lower = |s: &str| s.chars().all(|c| c.is_ascii_lowercase());
    let lang_ok = lang.len() == 2 && lower(lang);
    let region_ok = region.map_or(true, |r| (2..=4).contains(&r.len()) && lower(r));
    lang_ok && region_ok
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);

    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' is malformed",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !domain.contains('@') =>
        {
            Ok(())
        }
        _ => Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        ))),
    }
}
