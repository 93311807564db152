use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Risk levels for commands and actions, ordered ascending so that
/// `Ord::max` picks the most severe finding across decomposition branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Safe => write!(f, "SAFE"),
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Immutable result of classifying one command.
#[derive(Debug, Clone)]
pub struct RiskVerdict {
    /// The exact command string that was inspected.
    pub subject: String,
    pub level: RiskLevel,
    /// One of "filesystem", "security", "network", "general", "none".
    pub category: &'static str,
    /// Human-readable reason; empty exactly when `level` is `Safe`.
    pub reason: String,
    pub recommendation: &'static str,
}

impl RiskVerdict {
    /// CRITICAL and HIGH verdicts are blocked with no override.
    pub fn is_blocked(&self) -> bool {
        self.level >= RiskLevel::High
    }

    /// MEDIUM verdicts require an interactive confirmation.
    pub fn needs_confirmation(&self) -> bool {
        self.level == RiskLevel::Medium
    }
}

fn recommendation_for(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Critical => "This command is extremely dangerous and will be blocked.",
        RiskLevel::High => "This command is dangerous and will be blocked. Use safer alternatives.",
        RiskLevel::Medium => "This command requires special caution. Please confirm execution.",
        RiskLevel::Low => "This command is potentially sensitive. Check the result.",
        RiskLevel::Safe => "No special security concerns.",
    }
}

// ---------------------------------------------------------------------------
// Policy tables
// ---------------------------------------------------------------------------

struct PatternRule {
    regex: Regex,
    description: &'static str,
}

/// Raw-string pattern scan, applied case-insensitively before any
/// tokenization. A hit short-circuits to a blocking verdict.
static DANGEROUS_PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    let table: &[(&str, &str)] = &[
        // Command chaining into rm
        (r";\s*rm\b", "rm chained with ;"),
        (r"&&\s*rm\b", "rm chained with &&"),
        (r"\|\|\s*rm\b", "rm chained with ||"),
        (r"\|\s*rm\b", "rm fed from a pipe"),
        // Destructive substitution
        (r"\$\([^)]*\brm\b[^)]*\)", "rm inside Command Substitution $()"),
        (r"`[^`]*\brm\b[^`]*`", "rm inside Backtick Substitution"),
        // Indirect execution
        (r"\beval\b", "eval execution"),
        (r"\bexec\b", "exec execution"),
        // Raw device writes
        (r">\s*/dev/sd[a-z]", "raw write to SATA/SAS disk device"),
        (r">\s*/dev/nvme", "raw write to NVMe device"),
        (r">\s*/dev/hd[a-z]", "raw write to IDE disk device"),
        (r">\s*/dev/vd[a-z]", "raw write to virtio disk device"),
        // Encoded execution
        (r"\bbase64\b.*\|\s*bash", "base64 decode piped to bash"),
        (r"\bbase64\b.*\|\s*sh", "base64 decode piped to sh"),
        (r"\bbase64\b.*\|\s*zsh", "base64 decode piped to zsh"),
        (r"\bxxd\b.*\|\s*bash", "hex decode piped to bash"),
        // Fork bombs
        (r":\(\)\s*\{\s*:\|:&\s*\}\s*;:", "classic fork bomb"),
        (r":\(\)\s*\{\s*:\|:&\s*\};\s*:", "fork bomb variant"),
        // dd against devices
        (r"\bdd\b.*\bof=/dev/", "dd writing to a device"),
        (r"\bdd\b.*\bif=/dev/(zero|random|urandom).*\bof=", "dd disk wipe"),
        // rm rooted at critical paths
        (r"\brm\s+(-[rfRF]+\s+)?/", "rm rooted at /"),
        (r"\brm\s+(-[rfRF]+\s+)?~", "rm on the home directory"),
        (r"\brm\s+(-[rfRF]+\s+)?\.", "rm on dotfiles or the current directory"),
        // System configuration overwrites
        (r">\s*/etc/", "overwrite of /etc"),
        (r">>\s*/etc/", "append to /etc"),
        (r">\s*~/\.", "overwrite of a dotfile"),
        // Covering tracks
        (r"\bhistory\s+-c", "shell history wipe"),
        (r">\s*~/\.bash_history", "bash history overwrite"),
        (r">\s*~/\.zsh_history", "zsh history overwrite"),
        (r"\bcrontab\s+-r", "crontab removal"),
        // Network backdoors
        (r"\bnc\b.*-[elp]", "netcat listener"),
        (r"\bncat\b.*-[elp]", "ncat listener"),
        // Remote code execution
        (
            r"(curl|wget)\s+.*\|\s*(bash|sh|zsh|python|perl|ruby)",
            "download piped into an interpreter",
        ),
        (
            r"(curl|wget)\s+-[^\s]*o[^\s]*\s+.*&&\s*(bash|sh|chmod)",
            "download then execute",
        ),
    ];
    table
        .iter()
        .map(|(pattern, description)| PatternRule {
            regex: Regex::new(&format!("(?i){}", pattern))
                .unwrap_or_else(|e| panic!("invalid dangerous pattern {}: {}", pattern, e)),
            description,
        })
        .collect()
});

/// Base commands that are dangerous on sight. Entries that also appear in
/// `CONDITIONAL_DANGEROUS` are only dangerous with the listed arguments.
static DANGEROUS_COMMANDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Destructive
        "rm", "rmdir", "unlink", "shred",
        // Formatting / disk
        "mkfs", "fdisk", "parted", "format",
        // Permissions
        "chmod", "chown", "chattr",
        // Network exfiltration
        "nc", "netcat", "ncat",
        // Indirect execution
        "eval", "exec", "source",
        // System-critical
        "shutdown", "reboot", "init", "systemctl", "halt", "poweroff", "kill", "killall", "pkill",
        // Privilege escalation / user management
        "sudo", "su", "passwd", "useradd", "userdel", "usermod", "visudo", "chpasswd",
        // Disk operations
        "dd", "wipefs", "sgdisk", "gdisk",
    ]
    .into_iter()
    .collect()
});

/// Arguments that make an otherwise tolerated command dangerous.
static CONDITIONAL_DANGEROUS: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    HashMap::from([
        ("rm", vec!["-r", "-f", "-rf", "-fr", "--recursive", "--force", "-R"]),
        ("chmod", vec!["777", "000", "666", "-R", "--recursive"]),
        ("chown", vec!["-R", "--recursive"]),
        ("curl", vec!["|", "-o", "--output"]),
        ("wget", vec!["|", "-O", "--output-document"]),
        ("mv", vec!["/etc", "/usr", "/var", "/boot", "/bin", "/sbin", "/lib"]),
        ("cp", vec!["--no-preserve", "/etc", "/usr", "/var", "/boot"]),
    ])
});

/// Paths and dotfiles that are sensitive destinations regardless of the
/// command touching them.
static DANGEROUS_TARGETS: &[&str] = &[
    // System-critical directories
    "/", "/etc", "/usr", "/var", "/boot", "/root", "/home", "/bin", "/sbin", "/lib", "/lib64",
    "/opt", "/dev", "/proc", "/sys", "/run",
    // Home directory variants
    "~", "$HOME",
    // Sensitive dotfiles and directories
    ".ssh", ".gnupg", ".gpg", ".bashrc", ".zshrc", ".profile", ".bash_profile", ".bash_logout",
    ".env", ".git", ".gitconfig", ".config", ".local", ".aws", ".azure", ".kube",
    // Credentials
    "id_rsa", "id_ed25519", "id_ecdsa", ".netrc", ".npmrc", ".pypirc",
];

static INTERPRETER_COMMANDS: &[&str] = &[
    "python", "python3", "python2", "perl", "ruby", "node", "nodejs", "php", "lua", "tclsh",
    "wish", "awk", "gawk", "nawk",
];

static SHELL_COMMANDS: &[&str] = &["bash", "sh", "zsh", "fish", "csh", "tcsh", "dash", "ksh"];

static CHAIN_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\||[;&\n]+").unwrap_or_else(|e| panic!("chain split regex: {}", e)));

static BACKTICK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap_or_else(|e| panic!("backtick regex: {}", e)));

static REDIRECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r">+\s*(\S+)").unwrap_or_else(|e| panic!("redirect regex: {}", e)));

/// Bound on chain/pipe/substitution recursion so pathological nesting
/// terminates. Exceeding it is reported as inconclusive, not as safe.
const MAX_DECOMPOSITION_DEPTH: usize = 10;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Finding {
    level: RiskLevel,
    category: &'static str,
    reason: String,
}

impl Finding {
    fn in_context(self, context: &str) -> Finding {
        Finding {
            reason: format!("Dangerous command {}: {}", context, self.reason),
            ..self
        }
    }
}

/// Map a reason string onto a risk level and category. Pattern-scan hits are
/// additionally floored to HIGH by the caller.
fn severity_for(reason: &str) -> (RiskLevel, &'static str) {
    let lower = reason.to_lowercase();
    let has = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if has(&["critical", "fork", "dd", "mkfs"]) {
        (RiskLevel::Critical, "security")
    } else if has(&["netcat", "ncat", "listener", "download"]) {
        (RiskLevel::High, "network")
    } else if has(&["rm", "chmod", "chown"]) {
        (RiskLevel::High, "filesystem")
    } else {
        (RiskLevel::Medium, "general")
    }
}

fn finding(reason: String) -> Finding {
    let (level, category) = severity_for(&reason);
    Finding {
        level,
        category,
        reason,
    }
}

fn inconclusive() -> Finding {
    Finding {
        level: RiskLevel::Medium,
        category: "general",
        reason: "too deeply nested to fully analyze".to_string(),
    }
}

/// Keep the most severe finding seen so far.
fn note(worst: &mut Option<Finding>, candidate: Finding) {
    match worst {
        Some(existing) if existing.level >= candidate.level => {}
        _ => *worst = Some(candidate),
    }
}

/// Classify a shell command into a risk verdict.
///
/// Never fails: malformed input (including invalid shell quoting) is treated
/// as a signal, not an error. The verdict level is the maximum severity found
/// across every decomposition branch.
pub fn classify(command: &str) -> RiskVerdict {
    match inspect(command, 0) {
        Some(f) => RiskVerdict {
            subject: command.to_string(),
            level: f.level,
            category: f.category,
            reason: f.reason,
            recommendation: recommendation_for(f.level),
        },
        None => RiskVerdict {
            subject: command.to_string(),
            level: RiskLevel::Safe,
            category: "none",
            reason: String::new(),
            recommendation: recommendation_for(RiskLevel::Safe),
        },
    }
}

fn inspect(command: &str, depth: usize) -> Option<Finding> {
    let command = command.trim();
    if command.is_empty() {
        return None;
    }
    if depth >= MAX_DECOMPOSITION_DEPTH {
        return Some(inconclusive());
    }

    // 1. Pattern scan (fastest and most severe first)
    for rule in DANGEROUS_PATTERNS.iter() {
        if rule.regex.is_match(command) {
            let (level, category) = severity_for(rule.description);
            return Some(Finding {
                level: level.max(RiskLevel::High),
                category,
                reason: format!("Dangerous pattern detected: {}", rule.description),
            });
        }
    }

    let has_chaining = command.contains(';')
        || command.contains('\n')
        || command.contains("&&")
        || command.contains("||");
    // base64 piping is fully handled by the dedicated patterns above;
    // skipping the generic pipe split avoids double-flagging decode chains.
    let has_pipe = command.contains('|') && !command.to_lowercase().contains("base64");

    let mut worst: Option<Finding> = None;

    // 2. Chain decomposition: every part must be safe
    if has_chaining {
        for part in CHAIN_SPLIT_RE.split(command) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Some(f) = check_single(part) {
                note(&mut worst, f.in_context("in chain"));
            }
        }
    }

    // 3. Substitution recursion
    for inner in subshell_spans(command) {
        if let Some(f) = inspect(&inner, depth + 1) {
            note(&mut worst, f.in_context("in Command Substitution $()"));
        }
    }
    for caps in BACKTICK_RE.captures_iter(command) {
        if let Some(f) = inspect(&caps[1], depth + 1) {
            note(&mut worst, f.in_context("in Backtick Substitution"));
        }
    }

    // 4. Pipe decomposition
    if has_pipe {
        for segment in command.split('|') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            if let Some(f) = check_single(segment) {
                note(&mut worst, f.in_context("in pipe"));
            }
        }
    }

    // 5. Single command
    if !has_chaining && !has_pipe {
        if let Some(f) = check_single(command) {
            note(&mut worst, f);
        }
    }

    worst
}

/// Extract the contents of `$(...)` substitutions, tracking paren depth so
/// nested substitutions stay intact and recursion peels one layer at a time.
fn subshell_spans(command: &str) -> Vec<&str> {
    let bytes = command.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'(' {
            let start = i + 2;
            let mut depth = 1usize;
            let mut j = start;
            while j < bytes.len() && depth > 0 {
                match bytes[j] {
                    b'(' => depth += 1,
                    b')' => depth -= 1,
                    _ => {}
                }
                j += 1;
            }
            if depth == 0 {
                spans.push(&command[start..j - 1]);
                i = j;
                continue;
            }
            // Unterminated substitution; nothing more to extract.
            break;
        }
        i += 1;
    }
    spans
}

/// Check one command with no chain operators or pipes.
fn check_single(command: &str) -> Option<Finding> {
    let command = command.trim();
    if command.is_empty() {
        return None;
    }

    let tokens = match shell_words::split(command) {
        Ok(t) => t,
        // Invalid quoting can indicate manipulation; suspicious, not an error.
        Err(e) => return Some(finding(format!("Invalid shell quoting: {}", e))),
    };
    if tokens.is_empty() {
        return None;
    }

    let base_cmd = tokens[0]
        .rsplit('/')
        .next()
        .unwrap_or(&tokens[0])
        .to_lowercase();
    let args = &tokens[1..];

    // mkfs.* variants (mkfs.ext4, mkfs.xfs, ...)
    if base_cmd.starts_with("mkfs") {
        return Some(finding(format!("Filesystem formatting: {}", base_cmd)));
    }

    // Interpreter with a code-execution flag
    if INTERPRETER_COMMANDS.contains(&base_cmd.as_str()) {
        let code_exec_flags = ["-c", "-e", "--eval", "-exec"];
        if args.iter().any(|a| code_exec_flags.contains(&a.as_str())) {
            return Some(finding(format!("Code execution via {}", base_cmd)));
        }
    }

    // Shell with -c
    if SHELL_COMMANDS.contains(&base_cmd.as_str()) && args.iter().any(|a| a == "-c") {
        return Some(finding(format!("Shell execution via {} -c", base_cmd)));
    }

    // Directly dangerous commands
    if DANGEROUS_COMMANDS.contains(base_cmd.as_str()) {
        if let Some(dangerous_args) = CONDITIONAL_DANGEROUS.get(base_cmd.as_str()) {
            if let Some(hit) = match_dangerous_arg(args, dangerous_args) {
                return Some(finding(format!(
                    "{} with dangerous arguments: {}",
                    base_cmd, hit
                )));
            }
            if let Some(target) = args.iter().find_map(|a| dangerous_target_hit(a)) {
                return Some(finding(format!("{} on dangerous target: {}", base_cmd, target)));
            }
            // Without dangerous args or targets the command is tolerated
            // (e.g. `rm file.txt`).
            return None;
        }
        return Some(finding(format!("Dangerous command: {}", base_cmd)));
    }

    // Conditionally dangerous commands outside the always-dangerous set
    if let Some(dangerous_args) = CONDITIONAL_DANGEROUS.get(base_cmd.as_str()) {
        if let Some(hit) = match_dangerous_arg(args, dangerous_args) {
            return Some(finding(format!(
                "{} with dangerous arguments: {}",
                base_cmd, hit
            )));
        }
    }

    // Filesystem-modifying commands touching sensitive destinations
    let modifying_commands = ["mv", "cp", "ln", "touch", "mkdir", "tee"];
    if modifying_commands.contains(&base_cmd.as_str()) {
        if let Some(target) = args
            .iter()
            .filter(|a| !a.starts_with('-'))
            .find_map(|a| dangerous_target_hit(a))
        {
            return Some(finding(format!("{} on dangerous target: {}", base_cmd, target)));
        }
    }

    // Redirect targets (the pattern scan covers the common cases; this is
    // defense in depth for uncommon spellings)
    if command.contains('>') {
        if let Some(caps) = REDIRECT_RE.captures(command) {
            let target = caps[1].trim_matches(|c: char| c == '\'' || c == '"');
            if dangerous_target_hit(target).is_some() {
                return Some(finding(format!("Redirect to dangerous target: {}", target)));
            }
        }
    }

    None
}

/// Tokenized dangerous-argument matching: exact tokens, combined short flags
/// (`-rf` hits the `-r`/`-f` entries), and path-prefix for path-valued
/// entries. Deliberately no raw substring matching on the joined argument
/// string; that produced false positives on filenames.
fn match_dangerous_arg(args: &[String], dangerous: &[&'static str]) -> Option<String> {
    for arg in args {
        if dangerous.iter().any(|d| arg == d) {
            return Some(arg.clone());
        }
        if arg.starts_with('-') && !arg.starts_with("--") {
            for d in dangerous
                .iter()
                .filter(|d| d.starts_with('-') && !d.starts_with("--"))
            {
                let flag_chars = d.trim_start_matches('-');
                if !flag_chars.is_empty() && flag_chars.chars().all(|c| arg.contains(c)) {
                    return Some(arg.clone());
                }
            }
        }
        if !arg.starts_with('-') {
            for d in dangerous.iter().filter(|d| d.starts_with('/')) {
                if arg == d || arg.starts_with(&format!("{}/", d)) {
                    return Some(arg.clone());
                }
            }
        }
    }
    None
}

/// Match an argument against the dangerous-target list. Path-like targets
/// match exactly or as a directory prefix; name-like targets (dotfiles,
/// key files) match any path segment.
fn dangerous_target_hit(arg: &str) -> Option<&'static str> {
    let arg = arg.trim_end_matches('/');
    let arg = if arg.is_empty() { "/" } else { arg };

    for target in DANGEROUS_TARGETS {
        if target.starts_with('/') || *target == "~" || *target == "$HOME" {
            if arg == *target || arg.starts_with(&format!("{}/", target)) {
                return Some(target);
            }
        } else {
            for segment in arg.split('/') {
                if segment == *target || segment.starts_with(&format!("{}.", target)) {
                    return Some(target);
                }
            }
        }
    }
    None
}
