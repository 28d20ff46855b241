use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::Record;
use super::shop::ShopItem;

/// Experience needed per level
pub const XP_PER_LEVEL: u64 = 500;

/// Minutes of study that earn one credit
pub const MINUTES_PER_CREDIT: u32 = 10;

/// Rejections raised by shop purchases
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShopError {
    #[error("Not enough credits: item costs {cost}, balance is {balance}")]
    InsufficientCredits { cost: u64, balance: u64 },
    #[error("Item already owned: {0}")]
    AlreadyOwned(String),
}

/// Rejections raised by friend requests
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FriendError {
    #[error("Cannot send a friend request to yourself")]
    SelfRequest,
    #[error("Already friends with {0}")]
    AlreadyFriends(String),
    #[error("Friend request from {0} already pending")]
    AlreadyRequested(String),
    #[error("No pending friend request from {0}")]
    NoSuchRequest(String),
}

/// A user's identity, preferences and gamification counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique identifier for the user (UUID v4 as string)
    id: String,

    /// Display name, copied into posts and messages at creation time
    name: String,

    email: String,

    #[serde(default)]
    avatar: Option<String>,

    /// Experience points earned from study time
    #[serde(default)]
    xp: u64,

    /// Spendable shop currency
    #[serde(default)]
    credits: u64,

    /// Consecutive days with a login
    #[serde(default)]
    streak: u32,

    /// Last day a login was registered
    #[serde(default)]
    last_active: Option<NaiveDate>,

    #[serde(default = "default_theme")]
    theme: String,

    /// Study goal per day, in minutes
    #[serde(default = "default_daily_goal")]
    daily_goal_minutes: u32,

    #[serde(default)]
    friends: Vec<String>,

    /// User ids with a pending request to this user
    #[serde(default)]
    friend_requests: Vec<String>,

    /// Ids of shop items owned
    #[serde(default)]
    inventory: Vec<String>,

    created_at: DateTime<Utc>,
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_daily_goal() -> u32 {
    120
}

impl Record for UserProfile {
    const COLLECTION: &'static str = "profiles";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner_key(&self) -> &str {
        &self.id
    }
}

impl UserProfile {
    /// Creates a fresh profile with zeroed counters
    pub fn new(name: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            avatar: None,
            xp: 0,
            credits: 0,
            streak: 0,
            last_active: None,
            theme: default_theme(),
            daily_goal_minutes: default_daily_goal(),
            friends: Vec::new(),
            friend_requests: Vec::new(),
            inventory: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn get_email(&self) -> String {
        self.email.clone()
    }

    pub fn get_avatar(&self) -> Option<String> {
        self.avatar.clone()
    }

    pub fn set_avatar(&mut self, avatar: Option<String>) {
        self.avatar = avatar;
    }

    pub fn get_xp(&self) -> u64 {
        self.xp
    }

    pub fn get_credits(&self) -> u64 {
        self.credits
    }

    pub fn get_streak(&self) -> u32 {
        self.streak
    }

    pub fn get_last_active(&self) -> Option<NaiveDate> {
        self.last_active
    }

    pub fn get_theme(&self) -> String {
        self.theme.clone()
    }

    pub fn set_theme(&mut self, theme: String) {
        self.theme = theme;
    }

    pub fn get_daily_goal_minutes(&self) -> u32 {
        self.daily_goal_minutes
    }

    pub fn set_daily_goal_minutes(&mut self, minutes: u32) {
        self.daily_goal_minutes = minutes;
    }

    pub fn get_friends(&self) -> &[String] {
        &self.friends
    }

    pub fn get_friend_requests(&self) -> &[String] {
        &self.friend_requests
    }

    pub fn get_inventory(&self) -> &[String] {
        &self.inventory
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current level, starting at 1
    pub fn level(&self) -> u64 {
        1 + self.xp / XP_PER_LEVEL
    }

    /// Grants experience and credits for completed study time
    ///
    /// One XP per minute, one credit per full ten minutes.
    pub fn award_study_time(&mut self, minutes: u32) {
        self.xp = self.xp.saturating_add(u64::from(minutes));
        self.credits = self
            .credits
            .saturating_add(u64::from(minutes / MINUTES_PER_CREDIT));
    }

    /// Updates the login streak for `today`
    ///
    /// ### Returns
    ///
    /// `true` if the profile changed and should be saved
    pub fn register_daily_login(&mut self, today: NaiveDate) -> bool {
        match self.last_active {
            Some(last) if last == today => return false,
            Some(last) if last.succ_opt() == Some(today) => {
                self.streak = self.streak.saturating_add(1);
            }
            // A clock moving backwards keeps the streak untouched
            Some(last) if last > today => return false,
            _ => self.streak = 1,
        }
        self.last_active = Some(today);
        true
    }

    /// Buys a shop item with credits
    ///
    /// ### Errors
    ///
    /// Returns `ShopError` if the item is already owned or the balance is too low
    pub fn purchase(&mut self, item: &ShopItem) -> Result<(), ShopError> {
        if self.inventory.iter().any(|owned| owned == item.id) {
            return Err(ShopError::AlreadyOwned(item.id.to_string()));
        }
        if self.credits < item.cost {
            return Err(ShopError::InsufficientCredits {
                cost: item.cost,
                balance: self.credits,
            });
        }
        self.credits -= item.cost;
        self.inventory.push(item.id.to_string());
        Ok(())
    }

    /// Records a pending friend request from `from_user`
    ///
    /// ### Errors
    ///
    /// Returns `FriendError` for self-requests, existing friends and duplicates
    pub fn receive_friend_request(&mut self, from_user: &str) -> Result<(), FriendError> {
        if from_user == self.id {
            return Err(FriendError::SelfRequest);
        }
        if self.friends.iter().any(|f| f == from_user) {
            return Err(FriendError::AlreadyFriends(from_user.to_string()));
        }
        if self.friend_requests.iter().any(|r| r == from_user) {
            return Err(FriendError::AlreadyRequested(from_user.to_string()));
        }
        self.friend_requests.push(from_user.to_string());
        Ok(())
    }

    /// Moves a pending request from `from_user` into the friend list
    ///
    /// The requester's own profile must be updated with `add_friend`.
    ///
    /// ### Errors
    ///
    /// Returns `FriendError::NoSuchRequest` if no request is pending
    pub fn accept_friend_request(&mut self, from_user: &str) -> Result<(), FriendError> {
        let position = self
            .friend_requests
            .iter()
            .position(|r| r == from_user)
            .ok_or_else(|| FriendError::NoSuchRequest(from_user.to_string()))?;
        self.friend_requests.remove(position);
        self.add_friend(from_user);
        Ok(())
    }

    /// Adds a friend if not already present
    pub fn add_friend(&mut self, user_id: &str) {
        if !self.friends.iter().any(|f| f == user_id) {
            self.friends.push(user_id.to_string());
        }
    }
}
