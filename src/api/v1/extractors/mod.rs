/*!
 * Caller-identity extractor
 *
 * Responsibility:
 * - Provide the per-request Identity to handlers
 * - The identity type itself lives in services/auth; this module only does
 *   the axum plumbing
 *
 * Public API:
 * - Caller
 */

mod caller;

pub use caller::Caller;
