use std::sync::Arc;

use clockabilly::{
    Clockable,
    Local,
    NaiveTime,
    UtcClock,
};
use kube::runtime::events::Recorder;

use crate::objects::TemplateSet;

const REPORTER_NAME: &str = "devspace-controller";

#[derive(Clone)]
pub struct DevSpaceContext {
    pub client: kube::Client,
    pub system_ns: String,
    pub templates: Arc<TemplateSet>,
    pub recorder: Recorder,
    pub clock: Arc<dyn Clockable + Send + Sync>,
}

impl DevSpaceContext {
    pub fn new(client: kube::Client, system_ns: &str, templates: TemplateSet) -> DevSpaceContext {
        DevSpaceContext {
            recorder: Recorder::new(client.clone(), REPORTER_NAME.into()),
            client,
            system_ns: system_ns.into(),
            templates: Arc::new(templates),
            clock: Arc::new(UtcClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clockable + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    // Alive windows are wall-clock times in the controller's local timezone
    pub fn local_time(&self) -> NaiveTime {
        self.clock.now().with_timezone(&Local).time()
    }
}
