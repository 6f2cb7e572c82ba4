mod helpers;
mod mocks;

mod checkout;
mod webhook;
