use firmfetch_config::BrowserConfig;

/// Construct Chrome command-line arguments for a session.
///
/// ```
/// use firmfetch_config::BrowserConfig;
/// use firmfetch_drivers::browser::options::chrome_arguments;
///
/// let args = chrome_arguments(&BrowserConfig::default());
/// assert!(args.contains(&"--headless=new".to_string()));
/// assert!(args.contains(&"--window-size=1920,1080".to_string()));
/// ```
pub fn chrome_arguments(cfg: &BrowserConfig) -> Vec<String> {
    let mut args = Vec::with_capacity(6 + cfg.extra_args.len());
    if cfg.headless {
        args.push("--headless=new".to_string());
    }
    args.extend([
        format!("--window-size={},{}", cfg.window.width, cfg.window.height),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
    ]);
    if !cfg.user_agent.is_empty() {
        args.push(format!("--user-agent={}", cfg.user_agent));
    }
    args.extend(cfg.extra_args.iter().cloned());
    args
}
