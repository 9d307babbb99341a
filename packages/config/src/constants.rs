// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across agentbox

// Container Engine
pub const DOCKER_HOST: &str = "DOCKER_HOST";

// Sandbox Defaults
pub const SANDBOX_IMAGE: &str = "SANDBOX_IMAGE";
pub const SANDBOX_NETWORK: &str = "SANDBOX_NETWORK";
pub const SANDBOX_MEMORY_LIMIT: &str = "SANDBOX_MEMORY_LIMIT";
pub const SANDBOX_CPU_LIMIT: &str = "SANDBOX_CPU_LIMIT";
pub const SANDBOX_ENABLE_GPU: &str = "SANDBOX_ENABLE_GPU";
pub const SANDBOX_EXEC_TIMEOUT_SECS: &str = "SANDBOX_EXEC_TIMEOUT_SECS";
pub const SANDBOX_WORKSPACE_DIR: &str = "SANDBOX_WORKSPACE_DIR";
pub const SANDBOX_ENGINE_CONCURRENCY: &str = "SANDBOX_ENGINE_CONCURRENCY";

// Provider Selection
pub const SANDBOX_PROVIDER: &str = "SANDBOX_PROVIDER";
pub const CLOUD_PROVIDER: &str = "CLOUD_PROVIDER"; // Deployment target

// Alternate provider credentials (selection probing only)
pub const E2B_API_KEY: &str = "E2B_API_KEY";
pub const DAYTONA_API_KEY: &str = "DAYTONA_API_KEY"; // Legacy

// Logging
pub const RUST_LOG: &str = "RUST_LOG";
