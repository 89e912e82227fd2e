//! API request handlers

pub mod accounts;
pub mod catalog;
pub mod gateway;
pub mod internal;
pub mod permits;
pub mod tickets;
pub mod vehicles;

pub use accounts::{
    deactivate_principal, delete_enforcer, list_enforcers, login, me, provision_admin,
    provision_enforcer, signup, ListPrincipalsResponse, LoginRequest, TokenResponse,
};
pub use catalog::{
    create_permit_type, delete_permit_type, list_permit_types, update_permit_type,
    ListPermitTypesResponse, UpdatePriceRequest,
};
pub use gateway::{gateway_unpaid, gateway_validity};
pub use internal::{confirm_ownership, owner_contact};
pub use permits::{check_validity, issue_permit, list_permits, revoke_permit};
pub use tickets::{
    accept_challenge, challenge_ticket, issue_ticket, list_challenges, list_tickets, pay_ticket,
    reject_challenge, ChallengeRequest, ListTicketsResponse,
};
pub use vehicles::{
    list_vehicles, lookup_vehicle, register_vehicle, remove_vehicle, vehicle_permits,
    ListPermitsResponse, ListVehiclesResponse, PlateQuery,
};
