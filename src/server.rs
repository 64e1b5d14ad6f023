use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Server {
    Tranquility,
    Serenity,
    Singularity,
    Infinity,
    Thunderdome,
}

impl Default for Server {
    fn default() -> Self {
        Server::Tranquility
    }
}

impl Server {
    pub fn as_str(self) -> &'static str {
        match self {
            Server::Tranquility => "tranquility",
            Server::Serenity => "serenity",
            Server::Singularity => "singularity",
            Server::Infinity => "infinity",
            Server::Thunderdome => "thunderdome",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Server::Tranquility => "Tranquility",
            Server::Serenity => "Serenity (CN)",
            Server::Singularity => "Singularity (test)",
            Server::Infinity => "Infinity (CN)",
            Server::Thunderdome => "Thunderdome (event)",
        }
    }

    pub fn parse(value: &str) -> Option<Server> {
        match value.trim().to_lowercase().as_str() {
            "tranquility" | "tq" => Some(Server::Tranquility),
            "serenity" => Some(Server::Serenity),
            "singularity" | "sisi" => Some(Server::Singularity),
            "infinity" => Some(Server::Infinity),
            "thunderdome" => Some(Server::Thunderdome),
            _ => None,
        }
    }

    pub fn supports_name_lookup(self) -> bool {
        matches!(self, Server::Tranquility | Server::Serenity)
    }

    pub fn character_endpoint(self, character_id: &str) -> Option<String> {
        let (base, datasource) = match self {
            Server::Tranquility => ("https://esi.evetech.net/latest/characters/", "tranquility"),
            Server::Serenity => ("https://ali-esi.evepc.163.com/latest/characters/", "serenity"),
            Server::Singularity | Server::Infinity | Server::Thunderdome => return None,
        };
        Some(format!("{base}{character_id}/?datasource={datasource}"))
    }
}

pub fn supported_servers() -> Vec<Server> {
    vec![
        Server::Tranquility,
        Server::Serenity,
        Server::Singularity,
        Server::Infinity,
        Server::Thunderdome,
    ]
}
