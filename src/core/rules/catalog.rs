//! Shipped signature catalogs.
//!
//! Entries are `(name, pattern)` pairs. All patterns are compiled
//! case-insensitively; configuration can replace or extend every table.

/// Matched against path and query together.
pub const MALICIOUS_PATTERNS: &[(&str, &str)] = &[
    // Directory traversal
    ("path_traversal", r"\.\./"),
    ("path_traversal_backslash", r"\.\.\\"),
    // Script injection
    ("script_tag", r"<script"),
    ("javascript_uri", r"javascript:"),
    ("event_handler", r"\bon\w+\s*="),
    // SQL injection shapes
    ("sql_union_select", r"union\b.*\bselect"),
    ("sql_select_from", r"select\b.*\bfrom"),
    ("sql_insert_into", r"insert\b.*\binto"),
    ("sql_drop_table", r"drop\b.*\btable"),
    // Code injection calls
    ("code_exec", r"exec\s*\("),
    ("code_eval", r"eval\s*\("),
];

/// Matched against the path only.
pub const SENSITIVE_PATH_PATTERNS: &[(&str, &str)] = &[
    ("dotenv", r"/\.env"),
    ("dotgit", r"/\.git"),
    ("htaccess", r"/\.htaccess"),
    ("htpasswd", r"/\.htpasswd"),
    ("wp_admin", r"wp-admin"),
    ("wp_login", r"wp-login"),
    ("phpinfo", r"phpinfo"),
    ("php_script", r"\.php\b"),
    ("asp_script", r"\.asp\b"),
    ("aspx_script", r"\.aspx\b"),
    ("web_config", r"web\.config"),
];

/// Low-value crawlers, matched as substrings of `user-agent`.
pub const BOT_IDENTIFIERS: &[&str] = &[
    "ahrefsbot",
    "semrushbot",
    "mj12bot",
    "dotbot",
    "blexbot",
    "petalbot",
    "bytespider",
    "dataforseobot",
    "serpstatbot",
    "megaindex",
];
