// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Unit tests for configuration module

#[cfg(test)]
mod test {
    use super::super::*;
    use std::collections::HashMap;

    fn router(name: &str, address: &str, username: &str) -> RouterConfig {
        RouterConfig {
            name: name.to_string(),
            address: address.to_string(),
            username: username.to_string(),
            password: String::new(),
            login: LoginMethod::Challenge,
            connect_timeout_secs: None,
            read_timeout_secs: None,
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.routers.is_empty());
    }

    #[test]
    fn test_router_config_deserialize() {
        let json = r#"{
            "name": "test-router",
            "address": "192.168.1.1:8728",
            "username": "admin",
            "password": "secret"
        }"#;

        let router: RouterConfig = serde_json::from_str(json).unwrap();
        assert_eq!(router.name, "test-router");
        assert_eq!(router.address, "192.168.1.1:8728");
        assert_eq!(router.username, "admin");
        assert_eq!(router.password, "secret");
        assert_eq!(router.login, LoginMethod::Challenge);
        assert_eq!(router.connect_timeout_secs, Some(5));
        assert_eq!(router.read_timeout_secs, Some(30));
    }

    #[test]
    fn test_router_config_explicit_options() {
        let json = r#"{
            "name": "core",
            "address": "10.0.0.1:8728",
            "username": "api",
            "login": "plain",
            "connect_timeout_secs": null,
            "read_timeout_secs": 10
        }"#;

        let router: RouterConfig = serde_json::from_str(json).unwrap();
        assert_eq!(router.password, "");
        assert_eq!(router.login, LoginMethod::Plain);
        let options = router.connect_options();
        assert_eq!(options.connect_timeout, None);
        assert_eq!(options.io_timeout, Some(Duration::from_secs(10)));
        assert_eq!(options.login, LoginMethod::Plain);
    }

    #[test]
    fn test_multiple_routers_deserialize() {
        let json = r#"[
            {
                "name": "router1",
                "address": "192.168.1.1:8728",
                "username": "admin",
                "password": "pass1"
            },
            {
                "name": "router2",
                "address": "192.168.2.1:8728",
                "username": "admin",
                "password": "pass2"
            }
        ]"#;

        let routers = Config::parse_routers(json).unwrap();
        assert_eq!(routers.len(), 2);
        assert_eq!(routers[0].name, "router1");
        assert_eq!(routers[1].name, "router2");
    }

    #[test]
    fn test_parse_routers_invalid_json() {
        assert!(matches!(
            Config::parse_routers("not json"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(router("r", "10.0.0.1:8728", "admin").validate().is_ok());
        assert!(router(" ", "10.0.0.1:8728", "admin").validate().is_err());
        assert!(router("r", "10.0.0.1", "admin").validate().is_err());
        assert!(router("r", "10.0.0.1:8728", "").validate().is_err());
    }

    #[test]
    fn test_from_routers_drops_invalid() {
        let config = Config::from_routers(vec![
            router("good", "10.0.0.1:8728", "admin"),
            router("bad", "10.0.0.2", "admin"),
        ]);
        assert_eq!(config.routers.len(), 1);
        assert_eq!(config.routers[0].name, "good");
    }

    #[test]
    fn test_router_from_vars() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ROUTEROS_ADDRESS", "192.168.88.1:8728"),
            ("ROUTEROS_PASSWORD", "pw"),
            ("ROUTEROS_LOGIN", "auto"),
            ("ROUTEROS_READ_TIMEOUT", "7"),
        ]);
        let router = Config::router_from_vars(|k| vars.get(k).map(|v| (*v).to_string())).unwrap();
        assert_eq!(router.name, "default");
        assert_eq!(router.username, "admin");
        assert_eq!(router.password, "pw");
        assert_eq!(router.login, LoginMethod::Auto);
        assert_eq!(router.connect_timeout_secs, Some(5));
        assert_eq!(router.read_timeout_secs, Some(7));
    }

    #[test]
    fn test_router_from_vars_requires_address() {
        assert!(Config::router_from_vars(|_| None).is_none());
    }
}
