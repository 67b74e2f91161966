use std::time::Duration;

use serde::Serialize;

pub const DEFAULT_API_BASE: &str = "https://voyager.gu.se/api/";
pub const TRAJECTORY_PATH: &str = "trajectory/";
pub const VESSELS_PATH: &str = "vessels/";

/// Where the simulation API lives and how to talk to it.
#[derive(Clone, Debug, Serialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub trajectory_path: String,
    pub vessels_path: String,
    /// No timeout when unset; the transport default applies.
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            trajectory_path: TRAJECTORY_PATH.to_string(),
            vessels_path: VESSELS_PATH.to_string(),
            timeout: None,
        }
    }
}

impl ApiConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `VOYAGER_API_BASE` and `VOYAGER_API_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(base) = std::env::var("VOYAGER_API_BASE") {
            if !base.trim().is_empty() {
                cfg.base_url = base.trim().to_string();
            }
        }
        cfg.timeout = std::env::var("VOYAGER_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        cfg
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Icons {
    pub pin: &'static str,
    pub target: &'static str,
    pub clear: &'static str,
    pub zoom_in: &'static str,
    pub zoom_out: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct Header {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub blurb: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct InstructionStep {
    pub id: u8,
    pub image: &'static str,
    pub text: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct Instructions {
    pub title: &'static str,
    pub subtitle_purpose: &'static str,
    pub text_purpose: &'static str,
    pub subtitle_instructions: &'static str,
    pub steps: Vec<InstructionStep>,
}

#[derive(Clone, Debug, Serialize)]
pub struct About {
    pub title: &'static str,
    pub text: &'static str,
}

/// Map view: EPSG codes plus the initial center (lon, lat) and zoom.
#[derive(Clone, Debug, Serialize)]
pub struct Projection {
    pub to: &'static str,
    pub from: &'static str,
    pub center: [f64; 2],
    pub zoom: u8,
}

/// Everything the UI shows that is not a simulation parameter.
#[derive(Clone, Debug, Serialize)]
pub struct Config {
    pub document_title: &'static str,
    pub api: ApiConfig,
    pub tip: &'static str,
    pub icons: Icons,
    pub header: Header,
    pub instructions: Instructions,
    pub about: About,
    pub projection: Projection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            document_title: "Ocean Voyager",
            api: ApiConfig::default(),
            tip: "Right click on the map to add start points and a destination for your vessels!",
            icons: Icons {
                pin: "https://img.icons8.com/small/50/000000/sailing-ship-small.png",
                target: "https://img.icons8.com/small/50/000000/finish-flag.png",
                clear: "https://img.icons8.com/material/50/000000/delete-forever--v1.png",
                zoom_in: "https://img.icons8.com/material/50/000000/plus-math--v2.png",
                zoom_out: "https://img.icons8.com/material/50/000000/minus--v2.png",
            },
            header: Header {
                title: "Ocean Voyager",
                subtitle: "Exploration of seafaring",
                blurb: "The Ocean Voyager is an agent-based simulation system capable of \
                        generating seafaring trajectories based on winds and sea currents. \
                        Developed at the Centre for Digital Humanities at the University of Gothenburg.",
            },
            instructions: Instructions {
                title: "Usage and Instructions",
                subtitle_purpose: "Purpose",
                text_purpose: "The <i>Ocean Voyager</i> is a demonstration of the underlying Voyager \
                               tool, meant to simulate trajectories for ocean vessels with certain \
                               environmental conditions. Given a set of parameters and departure, the \
                               Voyager tool fetches data on the ocean current and winds and tries to \
                               calculate routes. It can be used to specify a set of departure points and \
                               a destination to approximate possible courses to reach the target.",
                subtitle_instructions: "Instructions",
                steps: vec![
                    InstructionStep {
                        id: 1,
                        image: "/assets/images/departure.png",
                        text: "First choose a starting position for your vessels. Right-click on the \
                               map and select <i>Add a departure point</i>. A small boat icon will \
                               appear on the coordinates. You can add multiple departure points by \
                               repeating this procedure.",
                    },
                    InstructionStep {
                        id: 2,
                        image: "/assets/images/destination.png",
                        text: "Next choose a single destination for your vessels. Right-click on the \
                               map and select <i>Add a destination point</i>. A small flag icon will \
                               appear on the coordinates. You may only have a single destination for \
                               your vessels.",
                    },
                    InstructionStep {
                        id: 3,
                        image: "/assets/images/settings.png",
                        text: "Now choose settings in the left sidebar. <ul>\
                               <li><b>Dates</b>: Select a range of dates from which to load the data \
                               and run the simulation.</li>\
                               <li><b>Propulsion type</b>: Select how the boats move; with sailing, \
                               paddling, or drifting without a destination.</li>\
                               <li><b>Vessel type</b>: Select a type of vessel with the chosen mode of \
                               propulsion.</li>\
                               <li><b>Paddling speed</b>: If the boats are paddling, enter a mean speed.</li>\
                               </ul> Observe that for sailing and paddling, a destination point is \
                               required, but not when drifting. When drifting, the destination will be \
                               ignored, and the vessel will follow the winds and currents.",
                    },
                    InstructionStep {
                        id: 4,
                        image: "/assets/images/successful.png",
                        text: "Finally click <i>Run</i> in the left sidebar. A loading screen will \
                               appear, and Voyager will simulate trajectories for your vessels.",
                    },
                    InstructionStep {
                        id: 5,
                        image: "/assets/images/advanced.png",
                        text: "For more control over the simulation, click the <i>Advanced</i> tab on \
                               the settings. Here you can specify the following parameters: <ul>\
                               <li><b>Launch interval</b>: The interval in days to send new boats, \
                               e.g. every 3 days.</li>\
                               <li><b>Max journey length</b>: Enter a time limit in days for the \
                               simulated trajectories.</li>\
                               <li><b>Timestep</b>: Control the resolution of the movement of the \
                               boats. A smaller value will simulate more fine-grained movements, but \
                               also take more time to calculate.</li></ul> In general, smaller \
                               geographical regions require a smaller timestep, and larger regions \
                               (e.g. the Atlantic Ocean) are more suitable for longer timesteps.",
                    },
                ],
            },
            about: About {
                title: "About Voyager",
                text: "Ocean Voyager simulates sea routes on a global scale, during different \
                       seasons and phases in history and prehistory. The tool will provide novel \
                       approaches to analysing and validating ancient trade routes, migration and \
                       cultural exchange. <br><br> Voyager utilizes experimental data on prehistoric \
                       boats with different capacity (e.g. log boats, plank-built boats, bark boats, \
                       skin boats) and various modes of propulsion as affected by meteorological and \
                       oceanographic patterns. <br><br> These patterns are based on open-source \
                       present-day data on sea currents and wind collected by Copernicus and ECMWF.",
            },
            projection: Projection {
                to: "EPSG:4326",
                from: "EPSG:3857",
                center: [3.0, 55.0],
                zoom: 6,
            },
        }
    }
}
