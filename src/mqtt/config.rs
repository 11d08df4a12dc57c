use std::time::Duration;

use rumqttc::MqttOptions;

use super::topics::TopicSet;
use crate::config::Config;

#[derive(Debug, Clone, PartialEq)]
pub struct MqttConfig {
    pub client_id: String,
    pub host: String,
    pub port: u16,
    pub keep_alive: Duration,
    pub topics: TopicSet,
    /// Capacity of the request channel between `AsyncClient` and the event loop
    pub request_capacity: usize,
}

impl MqttConfig {
    pub fn from_config(config: &Config) -> Self {
        MqttConfig {
            client_id: config.broker.client_id.clone(),
            host: config.broker.host.clone(),
            port: config.broker.port,
            keep_alive: Duration::from_secs(config.broker.keep_alive_secs),
            topics: TopicSet::new(&config.device.tenant, &config.device.device_id),
            request_capacity: 100,
        }
    }

    pub fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(self.client_id.clone(), self.host.clone(), self.port);
        options
            .set_keep_alive(self.keep_alive)
            .set_clean_session(true);
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_the_config() {
        let mut config = Config::default();
        config.broker.host = "broker.local".to_string();
        config.broker.keep_alive_secs = 30;

        let mqtt = MqttConfig::from_config(&config);
        let options = mqtt.mqtt_options();
        assert_eq!(options.broker_address(), ("broker.local".to_string(), 1883));
        assert_eq!(options.keep_alive(), Duration::from_secs(30));
        assert_eq!(mqtt.topics.status, "UNRaf/D8BC38E423D0/status");
    }
}
