//! Supabase Module
//!
//! Authoritative sources backed by a Supabase project: GoTrue for bearer
//! tokens and PostgREST for the `workspace_members` and `integrations` tables.

mod client;

pub use client::SupabaseClient;
