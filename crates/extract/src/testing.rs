use crate::llm::ChatModel;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned replies in order; errors are given as strings
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    temperatures: Mutex<Vec<f32>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            temperatures: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.temperatures.lock().unwrap().len()
    }

    pub fn temperatures(&self) -> Vec<f32> {
        self.temperatures.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, _prompt: &str, temperature: f32) -> Result<String> {
        self.temperatures.lock().unwrap().push(temperature);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(e)) => Err(anyhow::anyhow!(e)),
            None => Err(anyhow::anyhow!("no scripted reply left")),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
