//! Access control module
//!
//! Decides whether an actor may access a post, page, category or user that
//! is guarded by user groups.
//!
//! ## Access Control Model
//!
//! An object is restricted when at least one group covers it, either directly
//! or through an ancestor in the object hierarchy. Access to a restricted
//! object is granted with the following precedence (highest to lowest):
//!
//! 1. **Full access level** - the actor's user level meets `full_access_level`
//! 2. **Author** - the actor wrote the post and `authors_has_access_to_own` is set
//! 3. **IP range** - the actor's address falls in a covering group's ranges
//! 4. **Group member** - the actor is directly assigned to a covering group
//! 5. **Open groups** - every covering group is open to all in the current mode
//!
//! ## Example Snapshot Group
//!
//! ```json
//! { "id": 1, "name": "Intranet",
//!   "read_access": "restricted", "write_access": "restricted",
//!   "ip_ranges": ["10.0.0.1-10.0.255.255"],
//!   "objects": { "category": ["7"] } }
//! ```

pub mod engine;
pub mod ip_range;
pub mod types;

pub use engine::{AccessDecision, AccessEngine, GrantReason, ObjectGroup, ObjectGroups};
pub use ip_range::{IpRange, IpRangeMatcher};
pub use types::{AccessMode, AccessScope, ActorContext, AuthorLookup, ObjectId, ObjectType};
