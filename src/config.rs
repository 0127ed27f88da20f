use std::{env, net::{SocketAddr, ToSocketAddrs as _}};

use sea_orm::ConnectOptions;
use tracing::info;

use crate::consts::DEFAULT_HALF_MONTH_SALARY;

pub struct Config {
    pub host_address: SocketAddr,

    pub database_opt: ConnectOptions,

    pub jwt_key: String,

    pub payroll: PayrollConfig,
}

/// Pay rules shared by every payroll run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayrollConfig {
    /// Base salary `B` for a full half-month, in whole currency units
    pub half_month_salary: i64,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            half_month_salary: DEFAULT_HALF_MONTH_SALARY,
        }
    }
}

pub fn load() -> Config {
    Config {
        host_address: load_host_address(),
        database_opt: load_database_opt().into(),
        jwt_key: load_jwt_key(),
        payroll: PayrollConfig {
            half_month_salary: load_half_month_salary(),
        },
    }
}

fn load_host_address() -> SocketAddr {
    info!("Loading environment `HOST_ADDRESS`");

    let var = env::var("HOST_ADDRESS").unwrap_or_else(|_| "127.0.0.1:0".to_string());

    var.to_socket_addrs()
        .expect("`HOST_ADDRESS` is not in a valid format").nth(0)
        .expect("unable to resolve host from `HOST_ADDRESS`")
}

fn load_database_opt() -> impl Into<ConnectOptions> {
    info!("Loading environment `DATABASE_URL`");

    env::var("DATABASE_URL").expect("Environment `DATABASE_URL` is required to be set")
}

fn load_jwt_key() -> String {
    info!("Loading environment `JWT_SECRET`");

    env::var("JWT_SECRET").expect("Environment `JWT_SECRET` is required to be set")
}

fn load_half_month_salary() -> i64 {
    info!("Loading environment `HALF_MONTH_SALARY`");

    match env::var("HALF_MONTH_SALARY") {
        Ok(var) => parse_salary(&var).expect("`HALF_MONTH_SALARY` must be a positive whole amount"),
        Err(_) => DEFAULT_HALF_MONTH_SALARY,
    }
}

fn parse_salary(var: &str) -> Option<i64> {
    var.trim().parse::<i64>().ok().filter(|salary| *salary > 0)
}
