/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `users`: Account profile and password
/// - `equipment`: Public browse, listing CRUD
/// - `reservations`: Booking flow and reservation reads
/// - `admin`: Admin dashboards and user/equipment moderation

pub mod admin;
pub mod auth;
pub mod equipment;
pub mod health;
pub mod reservations;
pub mod users;
